use eframe::egui::Color32;
use egui_plot::MarkerShape;

// ---------------------------------------------------------------------------
// Class styles: shared class-label → {color, symbol, size} registry
// ---------------------------------------------------------------------------

/// The classic category-10 colors, also used for signal traces.
pub const DEFAULT_COLORS: [Color32; 10] = [
    Color32::from_rgb(0x1f, 0x77, 0xb4),
    Color32::from_rgb(0xff, 0x7f, 0x0e),
    Color32::from_rgb(0x2c, 0xa0, 0x2c),
    Color32::from_rgb(0xd6, 0x27, 0x28),
    Color32::from_rgb(0x94, 0x67, 0xbd),
    Color32::from_rgb(0x8c, 0x56, 0x4b),
    Color32::from_rgb(0xe3, 0x77, 0xc2),
    Color32::from_rgb(0x7f, 0x7f, 0x7f),
    Color32::from_rgb(0xbc, 0xbd, 0x22),
    Color32::from_rgb(0x17, 0xbe, 0xcf),
];

/// The ten marker shapes egui_plot offers, in default assignment order.
pub const DEFAULT_SYMBOLS: [MarkerShape; 10] = [
    MarkerShape::Circle,
    MarkerShape::Square,
    MarkerShape::Diamond,
    MarkerShape::Plus,
    MarkerShape::Cross,
    MarkerShape::Asterisk,
    MarkerShape::Up,
    MarkerShape::Down,
    MarkerShape::Left,
    MarkerShape::Right,
];

pub const DEFAULT_SIZE: u8 = 8;
pub const MIN_SIZE: u8 = 4;
pub const MAX_SIZE: u8 = 20;

/// UI label for a marker shape.
pub fn symbol_name(shape: MarkerShape) -> &'static str {
    match shape {
        MarkerShape::Circle => "Circle",
        MarkerShape::Square => "Square",
        MarkerShape::Diamond => "Diamond",
        MarkerShape::Plus => "Cross",
        MarkerShape::Cross => "X",
        MarkerShape::Asterisk => "Star",
        MarkerShape::Up => "Triangle up",
        MarkerShape::Down => "Triangle down",
        MarkerShape::Left => "Triangle left",
        MarkerShape::Right => "Triangle right",
    }
}

/// Marker style of one class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassStyle {
    pub color: Color32,
    pub symbol: MarkerShape,
    pub size: u8,
}

impl ClassStyle {
    /// Default style for the `index`-th label of a file, cycling both
    /// palettes modulo 10.
    pub fn palette_entry(index: usize) -> Self {
        ClassStyle {
            color: DEFAULT_COLORS[index % DEFAULT_COLORS.len()],
            symbol: DEFAULT_SYMBOLS[index % DEFAULT_SYMBOLS.len()],
            size: DEFAULT_SIZE,
        }
    }
}

impl Default for ClassStyle {
    fn default() -> Self {
        ClassStyle::palette_entry(0)
    }
}

/// One field of a [`ClassStyle`]. Values are applied as-is; range clamping
/// is left to the widgets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleField {
    Color(Color32),
    Symbol(MarkerShape),
    Size(u8),
}

/// Process-wide class-label → style mapping, shared across all files and
/// kept in insertion order. Styles persist across re-renders until reset.
#[derive(Debug, Clone, Default)]
pub struct StyleRegistry {
    entries: Vec<(String, ClassStyle)>,
}

impl StyleRegistry {
    /// Assign default styles to any label not yet present. `labels` must be
    /// in first-seen order for the file; the palette index follows that
    /// position, so already-customized labels keep their style.
    pub fn ensure_defaults(&mut self, labels: &[String]) {
        for (idx, label) in labels.iter().enumerate() {
            if !self.entries.iter().any(|(l, _)| l == label) {
                self.entries.push((label.clone(), ClassStyle::palette_entry(idx)));
            }
        }
    }

    /// Reassign defaults for exactly the given labels, overwriting any
    /// manual customization.
    pub fn reset(&mut self, labels: &[String]) {
        for (idx, label) in labels.iter().enumerate() {
            let style = ClassStyle::palette_entry(idx);
            match self.entries.iter_mut().find(|(l, _)| l == label) {
                Some(entry) => entry.1 = style,
                None => self.entries.push((label.clone(), style)),
            }
        }
    }

    /// Mutate one field of one class's style, creating the entry with the
    /// first palette defaults if it does not exist yet.
    pub fn update(&mut self, label: &str, field: StyleField) {
        let style = match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some((_, style)) => style,
            None => {
                self.entries.push((label.to_string(), ClassStyle::default()));
                &mut self.entries.last_mut().unwrap().1
            }
        };
        match field {
            StyleField::Color(color) => style.color = color,
            StyleField::Symbol(symbol) => style.symbol = symbol,
            StyleField::Size(size) => style.size = size,
        }
    }

    /// Current style of a class, falling back to the first palette entry.
    pub fn style_for(&self, label: &str) -> ClassStyle {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, s)| *s)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
