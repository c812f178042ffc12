use eframe::egui::Color32;
use egui_plot::MarkerShape;

use crate::data::model::{EcgRecord, UploadedFile};
use crate::data::normalize::{self, NormalizedPoint};
use crate::data::selection::Selection;
use crate::style::{ClassStyle, StyleRegistry, DEFAULT_COLORS};

// ---------------------------------------------------------------------------
// Renderer: state → declarative chart descriptions
//
// These builders are pure; the egui painting layer in `ui::plot` consumes
// the descriptions without touching application state.
// ---------------------------------------------------------------------------

/// Point cap for the full-trace overview before stride downsampling kicks in.
pub const MAX_OVERVIEW_POINTS: usize = 5000;

/// Deterministic trace color by series index, cycling the fixed palette.
pub fn signal_color(index: usize) -> Color32 {
    DEFAULT_COLORS[index % DEFAULT_COLORS.len()]
}

/// One drawable line series of a signal chart.
#[derive(Debug, Clone)]
pub struct SignalSeries {
    pub name: String,
    pub color: Color32,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone)]
pub struct SignalChart {
    pub title: String,
    pub series: Vec<SignalSeries>,
}

/// Which signals the windowed view draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeadSelection {
    #[default]
    All,
    One(usize),
}

/// Full-trace overview. When the record is longer than `max_points`, time
/// and every series are downsampled with the same stride
/// (`len / max_points`), keeping index alignment between them.
pub fn signal_overview(record: &EcgRecord, max_points: usize) -> SignalChart {
    let len = record.time.len();
    let stride = if max_points > 0 && len > max_points {
        len / max_points
    } else {
        1
    }
    .max(1);

    let series = record
        .signals
        .iter()
        .enumerate()
        .map(|(idx, sig)| SignalSeries {
            name: sig.name.clone(),
            color: signal_color(idx),
            points: record
                .time
                .iter()
                .step_by(stride)
                .zip(sig.data.iter().step_by(stride))
                .map(|(&t, &y)| [t, y])
                .collect(),
        })
        .collect();

    SignalChart {
        title: format!("ECG Signal: {}", record.record_name),
        series,
    }
}

/// Time-window sub-view: slices the original arrays by
/// `[floor(start·fs), floor((start+window)·fs))` without re-downsampling,
/// so the window shows full resolution even when the overview did not.
pub fn signal_window(
    record: &EcgRecord,
    start_time: f64,
    window_size: f64,
    lead: LeadSelection,
) -> SignalChart {
    let fs = record.sampling_frequency;
    let end = (((start_time + window_size) * fs).floor() as usize).min(record.time.len());
    let start = ((start_time * fs).floor() as usize).min(end);
    let time = &record.time[start..end];

    let mut series = Vec::new();
    for (idx, sig) in record.signals.iter().enumerate() {
        if let LeadSelection::One(selected) = lead {
            if selected != idx {
                continue;
            }
        }
        series.push(SignalSeries {
            name: sig.name.clone(),
            color: signal_color(idx),
            points: time
                .iter()
                .zip(sig.data[start..end].iter())
                .map(|(&t, &y)| [t, y])
                .collect(),
        });
    }

    SignalChart {
        title: format!("ECG Signal: {}", record.record_name),
        series,
    }
}

// ---------------------------------------------------------------------------
// Ternary chart
// ---------------------------------------------------------------------------

/// One styled marker series, usually a class group.
#[derive(Debug, Clone)]
pub struct TernarySeries {
    pub name: String,
    pub style: ClassStyle,
    pub points: Vec<NormalizedPoint>,
    /// Invisible axis-holding marker, excluded from the legend.
    pub placeholder: bool,
}

#[derive(Debug, Clone)]
pub struct TernaryChart {
    pub title: String,
    /// Display names of the three value columns, in (a, b, c) order.
    pub axis_titles: [String; 3],
    pub series: Vec<TernarySeries>,
}

/// Build the ternary chart for one file under its current selection.
/// Zero survivors yield an invisible placeholder marker instead of an empty
/// series list, so the chart axes stay alive.
pub fn ternary_chart(
    file: &UploadedFile,
    selection: &Selection,
    styles: &StyleRegistry,
) -> TernaryChart {
    let axis_titles = [
        file.column_names.value1.clone(),
        file.column_names.value2.clone(),
        file.column_names.value3.clone(),
    ];

    let groups = normalize::group_by_class(file, selection);
    if groups.is_empty() {
        return TernaryChart {
            title: "Ternary Plot (No Data Selected)".to_string(),
            axis_titles,
            series: vec![placeholder_series()],
        };
    }

    let (selected, _) = selection.count();
    let series = groups
        .into_iter()
        .map(|group| TernarySeries {
            style: styles.style_for(&group.label),
            name: group.label,
            points: group.points,
            placeholder: false,
        })
        .collect();

    TernaryChart {
        title: format!("Ternary Plot by Class ({selected} points selected)"),
        axis_titles,
        series,
    }
}

fn placeholder_series() -> TernarySeries {
    TernarySeries {
        name: String::new(),
        style: ClassStyle {
            color: Color32::TRANSPARENT,
            symbol: MarkerShape::Circle,
            size: 1,
        },
        points: vec![NormalizedPoint {
            a: 1e-6,
            b: 1e-6,
            c: 1.0 - 2e-6,
            label: String::new(),
        }],
        placeholder: true,
    }
}
