use super::model::{Row, UploadedFile};
use super::selection::Selection;

// ---------------------------------------------------------------------------
// Normalization & grouping: selected rows → class groups on the simplex
// ---------------------------------------------------------------------------

/// Label used for rows with an empty or missing class.
const UNKNOWN_CLASS: &str = "Unknown";

/// Label used for rows with an empty or missing title.
const UNTITLED: &str = "Untitled";

/// One row projected onto the unit simplex: `a + b + c == 1` whenever the
/// source triple's sum is nonzero.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPoint {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub label: String,
}

/// Points for one class label, in row order.
#[derive(Debug, Clone)]
pub struct ClassGroup {
    pub label: String,
    pub points: Vec<NormalizedPoint>,
}

/// Normalize a single row, or `None` if it cannot be placed on the simplex.
///
/// Unparseable cells behave like NaN, so a row with any bad cell is dropped
/// along with the `total == 0` rows. Policy: silent omission, not an error.
pub fn normalize_row(row: &Row) -> Option<NormalizedPoint> {
    let v1 = row.value1.as_f64().unwrap_or(f64::NAN);
    let v2 = row.value2.as_f64().unwrap_or(f64::NAN);
    let v3 = row.value3.as_f64().unwrap_or(f64::NAN);

    let total = v1 + v2 + v3;
    if total == 0.0 || !total.is_finite() {
        return None;
    }

    let label = if row.title.is_empty() {
        UNTITLED.to_string()
    } else {
        row.title.clone()
    };

    Some(NormalizedPoint {
        a: v1 / total,
        b: v2 / total,
        c: v3 / total,
        label,
    })
}

/// Group the selected, normalizable rows of a file by class label,
/// preserving first-occurrence order of labels.
pub fn group_by_class(file: &UploadedFile, selection: &Selection) -> Vec<ClassGroup> {
    let mut groups: Vec<ClassGroup> = Vec::new();

    for (idx, row) in file.rows.iter().enumerate() {
        if !selection.is_selected(idx) {
            continue;
        }
        let Some(point) = normalize_row(row) else {
            continue;
        };

        let label = if row.class.is_empty() {
            UNKNOWN_CLASS
        } else {
            row.class.as_str()
        };

        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => group.points.push(point),
            None => groups.push(ClassGroup {
                label: label.to_string(),
                points: vec![point],
            }),
        }
    }

    groups
}

/// Unique class labels of a file in first-seen order, with the empty class
/// mapped to `"Unknown"`. This is the order default styles follow.
pub fn class_labels(file: &UploadedFile) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for row in &file.rows {
        let label = if row.class.is_empty() {
            UNKNOWN_CLASS
        } else {
            row.class.as_str()
        };
        if !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
    }
    labels
}
