use std::fmt;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// CellValue – one cell of a value column
// ---------------------------------------------------------------------------

/// A single value-column cell as returned by `/upload`.
///
/// The server echoes CSV cells verbatim, so a value may arrive as a JSON
/// string or a number. Parsing to `f64` is deferred to render time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl CellValue {
    /// Interpret the cell as a float, if possible.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

// ---------------------------------------------------------------------------
// Row / UploadedFile – the per-file CSV store
// ---------------------------------------------------------------------------

/// One parsed CSV row. Immutable once received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub value1: CellValue,
    #[serde(default)]
    pub value2: CellValue,
    #[serde(default)]
    pub value3: CellValue,
}

/// Display names of the columns as they appeared in the source CSV.
/// The server normalizes field keys but reports the original headers here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnNames {
    #[serde(default = "default_title_col")]
    pub title: String,
    #[serde(default = "default_class_col")]
    pub class: String,
    #[serde(default = "default_value1_col")]
    pub value1: String,
    #[serde(default = "default_value2_col")]
    pub value2: String,
    #[serde(default = "default_value3_col")]
    pub value3: String,
}

fn default_title_col() -> String {
    "title".to_string()
}
fn default_class_col() -> String {
    "class".to_string()
}
fn default_value1_col() -> String {
    "value1".to_string()
}
fn default_value2_col() -> String {
    "value2".to_string()
}
fn default_value3_col() -> String {
    "value3".to_string()
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            title: default_title_col(),
            class: default_class_col(),
            value1: default_value1_col(),
            value2: default_value2_col(),
            value3: default_value3_col(),
        }
    }
}

/// A parsed CSV file held by the per-file store.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub rows: Vec<Row>,
    pub column_names: ColumnNames,
}

impl UploadedFile {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the file has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Wire responses
// ---------------------------------------------------------------------------

/// JSON body of `POST /upload`.
#[derive(Debug, Deserialize)]
pub struct CsvUploadResponse {
    #[serde(default)]
    pub data: Vec<Row>,
    #[serde(default)]
    pub column_names: Option<ColumnNames>,
    #[serde(default)]
    pub error: Option<String>,
}

/// JSON body of `POST /upload_wfdb`.
#[derive(Debug, Deserialize)]
pub struct WfdbUploadResponse {
    #[serde(default)]
    pub metadata: Option<RecordMetadata>,
    #[serde(default)]
    pub signal_data: Option<SignalData>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordMetadata {
    pub record_name: String,
    pub num_signals: usize,
    pub sampling_frequency: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalData {
    pub signals: Vec<SignalTrace>,
    pub time: Vec<f64>,
    pub num_samples: usize,
}

// ---------------------------------------------------------------------------
// SignalTrace / EcgRecord – the validated signal state
// ---------------------------------------------------------------------------

/// One named signal series of a WFDB record.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalTrace {
    pub name: String,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub data: Vec<f64>,
}

fn default_unit() -> String {
    "mV".to_string()
}

/// Amplitude summary of one signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Cap on the number of samples the amplitude summary looks at.
const STATS_SAMPLE_CAP: usize = 10_000;

impl SignalTrace {
    /// Min / max / mean amplitude over a decimated copy of the data
    /// (every ceil(len / 10 000)-th sample once the record exceeds the cap).
    pub fn stats(&self) -> Option<SignalStats> {
        if self.data.is_empty() {
            return None;
        }
        let stride = self.data.len().div_ceil(STATS_SAMPLE_CAP).max(1);
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut n = 0usize;
        for &v in self.data.iter().step_by(stride) {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            n += 1;
        }
        Some(SignalStats {
            min,
            max,
            mean: sum / n as f64,
        })
    }
}

/// A validated WFDB record ready for rendering. All signal series have the
/// same length as `time`.
#[derive(Debug, Clone)]
pub struct EcgRecord {
    pub record_name: String,
    pub sampling_frequency: f64,
    pub num_signals: usize,
    pub num_samples: usize,
    pub time: Vec<f64>,
    pub signals: Vec<SignalTrace>,
}

impl EcgRecord {
    /// Record duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sampling_frequency > 0.0 {
            self.num_samples as f64 / self.sampling_frequency
        } else {
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_value_parses_strings_and_numbers() {
        let cells: Vec<CellValue> = serde_json::from_str(r#"[1, 2.5, "3.25", " 4 ", "n/a"]"#).unwrap();
        let parsed: Vec<Option<f64>> = cells.iter().map(CellValue::as_f64).collect();
        assert_eq!(parsed, vec![Some(1.0), Some(2.5), Some(3.25), Some(4.0), None]);
    }

    #[test]
    fn row_fills_missing_fields_with_defaults() {
        let row: Row = serde_json::from_str(r#"{"value1": 1, "value2": "2", "value3": 3}"#).unwrap();
        assert_eq!(row.title, "");
        assert_eq!(row.class, "");
        assert_eq!(row.value2.as_f64(), Some(2.0));
    }

    #[test]
    fn uploaded_file_length() {
        let file = UploadedFile {
            file_name: "a.csv".into(),
            rows: vec![Row::default()],
            column_names: ColumnNames::default(),
        };
        assert_eq!(file.len(), 1);
        assert!(!file.is_empty());
    }

    #[test]
    fn column_names_default_per_field() {
        let names: ColumnNames = serde_json::from_str(r#"{"value1": "SiO2"}"#).unwrap();
        assert_eq!(names.value1, "SiO2");
        assert_eq!(names.value2, "value2");
        assert_eq!(names.title, "title");
    }

    #[test]
    fn stats_over_short_signal() {
        let trace = SignalTrace {
            name: "I".into(),
            unit: "mV".into(),
            data: vec![1.0, -1.0, 3.0],
        };
        let stats = trace.stats().unwrap();
        assert_eq!(stats.min, -1.0);
        assert_eq!(stats.max, 3.0);
        assert!((stats.mean - 1.0).abs() < 1e-12);
    }

    #[test]
    fn stats_decimate_long_signals() {
        // 25 000 samples → stride 3, so only every third sample is seen.
        let mut data = vec![0.0; 25_000];
        data[1] = 100.0; // skipped by the stride
        data[3] = 7.0;
        let trace = SignalTrace {
            name: "II".into(),
            unit: "mV".into(),
            data,
        };
        let stats = trace.stats().unwrap();
        assert_eq!(stats.max, 7.0);
    }

    #[test]
    fn stats_of_empty_signal_is_none() {
        let trace = SignalTrace {
            name: "x".into(),
            unit: "mV".into(),
            data: vec![],
        };
        assert!(trace.stats().is_none());
    }

    #[test]
    fn record_duration() {
        let record = EcgRecord {
            record_name: "100".into(),
            sampling_frequency: 250.0,
            num_signals: 0,
            num_samples: 2500,
            time: vec![],
            signals: vec![],
        };
        assert!((record.duration_secs() - 10.0).abs() < 1e-12);
    }
}
