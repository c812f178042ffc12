// ---------------------------------------------------------------------------
// Row selection: which rows of a file feed the ternary plot
// ---------------------------------------------------------------------------

/// Per-file row inclusion flags, index-aligned with the file's rows.
/// Every row starts selected; toggles only touch the in-memory flags.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    included: Vec<bool>,
}

impl Selection {
    /// All rows selected, one flag per row.
    pub fn all(len: usize) -> Self {
        Selection {
            included: vec![true; len],
        }
    }

    /// Flip one row's flag. Out-of-range indices are ignored.
    pub fn toggle(&mut self, row: usize) {
        if let Some(flag) = self.included.get_mut(row) {
            *flag = !*flag;
        }
    }

    pub fn select_all(&mut self) {
        self.included.fill(true);
    }

    pub fn deselect_all(&mut self) {
        self.included.fill(false);
    }

    /// `(selected, total)` for the counter display.
    pub fn count(&self) -> (usize, usize) {
        let selected = self.included.iter().filter(|&&f| f).count();
        (selected, self.included.len())
    }

    pub fn is_selected(&self, row: usize) -> bool {
        self.included.get(row).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.included.len()
    }

    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }
}
