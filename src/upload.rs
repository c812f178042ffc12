use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;

use eframe::egui;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;

use crate::data::model::{CsvUploadResponse, EcgRecord, UploadedFile, WfdbUploadResponse};

// ---------------------------------------------------------------------------
// Upload client
//
// CSV files go to `POST {server}/upload` one request per file (multipart
// field `file`); WFDB files go to `POST {server}/upload_wfdb` in a single
// request (repeated multipart field `files`). Requests run on a background
// worker thread and report back over an mpsc channel; the UI thread never
// blocks on the network.
// ---------------------------------------------------------------------------

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Everything that can go wrong between picking files and a rendered chart.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No files selected")]
    NoFilesSelected,

    #[error("No WFDB files found. Please select .dat and .hea files.")]
    NotWfdbFiles,

    #[error("Reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Request for {file} failed: {source}")]
    Transport {
        file: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{file}: HTTP status {status}")]
    HttpStatus { file: String, status: StatusCode },

    /// The server answered with a logical error in the JSON payload.
    #[error("{file}: {message}")]
    Server {
        file: String,
        message: String,
        details: Option<String>,
    },

    /// A successful response missing fields rendering depends on.
    #[error("{file}: {message}")]
    MalformedResponse { file: String, message: String },
}

impl UploadError {
    /// Multi-line text for the inline error panel, including the server's
    /// optional detail text.
    pub fn display_text(&self) -> String {
        match self {
            UploadError::Server {
                details: Some(details),
                ..
            } => format!("{self}\n\nDetails: {details}"),
            other => other.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Client-side validation (before any request is sent)
// ---------------------------------------------------------------------------

pub fn validate_csv_selection(paths: &[PathBuf]) -> Result<(), UploadError> {
    if paths.is_empty() {
        return Err(UploadError::NoFilesSelected);
    }
    Ok(())
}

/// At least one file and at least one `.dat` or `.hea` among them
/// (case-insensitive), mirroring what the server will accept.
pub fn validate_wfdb_selection(paths: &[PathBuf]) -> Result<(), UploadError> {
    if paths.is_empty() {
        return Err(UploadError::NoFilesSelected);
    }
    let has_wfdb = paths.iter().any(|p| {
        p.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("dat") || e.eq_ignore_ascii_case("hea"))
            .unwrap_or(false)
    });
    if has_wfdb {
        Ok(())
    } else {
        Err(UploadError::NotWfdbFiles)
    }
}

// ---------------------------------------------------------------------------
// Response decoding (pure, testable without a server)
// ---------------------------------------------------------------------------

/// Decode a `/upload` body into an [`UploadedFile`]. A JSON `error` field
/// wins over everything else in the payload.
pub fn parse_csv_response(file_name: &str, body: &str) -> Result<UploadedFile, UploadError> {
    let response: CsvUploadResponse =
        serde_json::from_str(body).map_err(|e| UploadError::MalformedResponse {
            file: file_name.to_string(),
            message: format!("invalid JSON response: {e}"),
        })?;

    if let Some(message) = response.error {
        return Err(UploadError::Server {
            file: file_name.to_string(),
            message,
            details: None,
        });
    }

    Ok(UploadedFile {
        file_name: file_name.to_string(),
        rows: response.data,
        column_names: response.column_names.unwrap_or_default(),
    })
}

/// Decode a `/upload_wfdb` body into a validated [`EcgRecord`].
///
/// Missing metadata/signal fields and length mismatches are rendering
/// precondition failures, reported as errors rather than crashing later.
pub fn parse_wfdb_response(body: &str) -> Result<EcgRecord, UploadError> {
    const BATCH: &str = "WFDB record";

    let response: WfdbUploadResponse =
        serde_json::from_str(body).map_err(|e| UploadError::MalformedResponse {
            file: BATCH.to_string(),
            message: format!("invalid JSON response: {e}"),
        })?;

    let file = response.filename.clone().unwrap_or_else(|| BATCH.to_string());

    if let Some(message) = response.error {
        return Err(UploadError::Server {
            file,
            message,
            details: response.details,
        });
    }

    let malformed = |message: String| UploadError::MalformedResponse {
        file: file.clone(),
        message,
    };

    let metadata = response
        .metadata
        .ok_or_else(|| malformed("missing metadata".to_string()))?;
    let signal_data = response
        .signal_data
        .ok_or_else(|| malformed("missing signal data".to_string()))?;

    if signal_data.signals.is_empty() {
        return Err(malformed("no signal data found".to_string()));
    }
    if signal_data.time.is_empty() {
        return Err(malformed("no time data found".to_string()));
    }
    for sig in &signal_data.signals {
        if sig.data.len() != signal_data.time.len() {
            return Err(malformed(format!(
                "signal '{}' has {} samples but the time axis has {}",
                sig.name,
                sig.data.len(),
                signal_data.time.len()
            )));
        }
    }

    Ok(EcgRecord {
        record_name: metadata.record_name,
        sampling_frequency: metadata.sampling_frequency,
        num_signals: metadata.num_signals,
        num_samples: signal_data.num_samples,
        time: signal_data.time,
        signals: signal_data.signals,
    })
}

// ---------------------------------------------------------------------------
// Blocking HTTP calls (worker thread only)
// ---------------------------------------------------------------------------

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string()
}

fn read_part(path: &Path) -> Result<Part, UploadError> {
    let bytes = std::fs::read(path).map_err(|source| UploadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Part::bytes(bytes).file_name(file_name_of(path)))
}

/// POST one CSV file and decode the reply. Error payloads arrive with a
/// failure status too, so decoding is attempted before the status matters.
fn upload_one_csv(client: &Client, url: &str, path: &Path) -> Result<UploadedFile, UploadError> {
    let name = file_name_of(path);
    let form = Form::new().part("file", read_part(path)?);

    let response = client
        .post(url)
        .multipart(form)
        .send()
        .map_err(|source| UploadError::Transport {
            file: name.clone(),
            source,
        })?;
    let status = response.status();
    let body = response.text().map_err(|source| UploadError::Transport {
        file: name.clone(),
        source,
    })?;

    match parse_csv_response(&name, &body) {
        Err(UploadError::MalformedResponse { .. }) if !status.is_success() => {
            Err(UploadError::HttpStatus { file: name, status })
        }
        other => other,
    }
}

/// Upload a whole CSV batch, preserving selection order. All-or-nothing:
/// the first failing file aborts the batch and nothing is returned.
pub fn upload_csv_batch(
    client: &Client,
    server_url: &str,
    paths: &[PathBuf],
) -> Result<Vec<UploadedFile>, UploadError> {
    validate_csv_selection(paths)?;
    let url = format!("{server_url}/upload");

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(upload_one_csv(client, &url, path)?);
    }
    Ok(files)
}

/// Upload all WFDB files in one multipart request and decode the record.
pub fn upload_wfdb(
    client: &Client,
    server_url: &str,
    paths: &[PathBuf],
) -> Result<EcgRecord, UploadError> {
    const BATCH: &str = "WFDB record";

    validate_wfdb_selection(paths)?;
    let url = format!("{server_url}/upload_wfdb");

    let mut form = Form::new();
    for path in paths {
        form = form.part("files", read_part(path)?);
    }

    let response = client
        .post(&url)
        .multipart(form)
        .send()
        .map_err(|source| UploadError::Transport {
            file: BATCH.to_string(),
            source,
        })?;
    let status = response.status();
    let body = response.text().map_err(|source| UploadError::Transport {
        file: BATCH.to_string(),
        source,
    })?;

    match parse_wfdb_response(&body) {
        Err(UploadError::MalformedResponse { .. }) if !status.is_success() => {
            Err(UploadError::HttpStatus {
                file: BATCH.to_string(),
                status,
            })
        }
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Background workers
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum UploadOutcome {
    CsvBatch(Result<Vec<UploadedFile>, UploadError>),
    Wfdb(Box<Result<EcgRecord, UploadError>>),
}

/// A finished upload, tagged with the batch generation that started it so
/// results of a superseded batch can be discarded on receipt.
#[derive(Debug)]
pub struct UploadEvent {
    pub generation: u64,
    pub outcome: UploadOutcome,
}

pub fn spawn_csv_upload(
    tx: Sender<UploadEvent>,
    ctx: egui::Context,
    server_url: String,
    paths: Vec<PathBuf>,
    generation: u64,
) {
    thread::spawn(move || {
        let client = Client::new();
        let outcome = UploadOutcome::CsvBatch(upload_csv_batch(&client, &server_url, &paths));
        if tx.send(UploadEvent { generation, outcome }).is_ok() {
            ctx.request_repaint();
        }
    });
}

pub fn spawn_wfdb_upload(
    tx: Sender<UploadEvent>,
    ctx: egui::Context,
    server_url: String,
    paths: Vec<PathBuf>,
    generation: u64,
) {
    thread::spawn(move || {
        let client = Client::new();
        let outcome = UploadOutcome::Wfdb(Box::new(upload_wfdb(&client, &server_url, &paths)));
        if tx.send(UploadEvent { generation, outcome }).is_ok() {
            ctx.request_repaint();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|name| PathBuf::from(*name)).collect()
    }

    #[test]
    fn empty_selections_are_rejected() {
        assert!(matches!(
            validate_csv_selection(&[]),
            Err(UploadError::NoFilesSelected)
        ));
        assert!(matches!(
            validate_wfdb_selection(&[]),
            Err(UploadError::NoFilesSelected)
        ));
    }

    #[test]
    fn wfdb_selection_needs_dat_or_hea() {
        assert!(validate_wfdb_selection(&paths(&["a.csv", "b.txt"])).is_err());
        assert!(validate_wfdb_selection(&paths(&["a.csv", "rec.dat"])).is_ok());
        assert!(validate_wfdb_selection(&paths(&["rec.HEA"])).is_ok());
    }

    #[test]
    fn csv_response_decodes_rows_and_columns() {
        let body = r#"{
            "data": [{"title": "p1", "class": "A", "value1": 1, "value2": "1", "value3": 2}],
            "column_names": {"title": "title", "class": "class",
                             "value1": "SiO2", "value2": "Al2O3", "value3": "MgO"}
        }"#;
        let file = parse_csv_response("rocks.csv", body).unwrap();
        assert_eq!(file.file_name, "rocks.csv");
        assert_eq!(file.rows.len(), 1);
        assert_eq!(file.column_names.value2, "Al2O3");
    }

    #[test]
    fn csv_response_defaults_missing_column_names() {
        let file = parse_csv_response("a.csv", r#"{"data": []}"#).unwrap();
        assert_eq!(file.column_names.value1, "value1");
    }

    #[test]
    fn csv_error_field_wins() {
        let err = parse_csv_response("a.csv", r#"{"data": [], "error": "Invalid file format"}"#)
            .unwrap_err();
        match err {
            UploadError::Server { file, message, .. } => {
                assert_eq!(file, "a.csv");
                assert_eq!(message, "Invalid file format");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn csv_garbage_body_is_malformed() {
        assert!(matches!(
            parse_csv_response("a.csv", "<html>504</html>"),
            Err(UploadError::MalformedResponse { .. })
        ));
    }

    fn wfdb_body(time_len: usize, data_len: usize) -> String {
        let time: Vec<f64> = (0..time_len).map(|i| i as f64 / 250.0).collect();
        let data: Vec<f64> = (0..data_len).map(|i| i as f64).collect();
        serde_json::json!({
            "metadata": {"record_name": "100", "num_signals": 1, "sampling_frequency": 250.0},
            "signal_data": {
                "signals": [{"name": "I", "unit": "mV", "data": data}],
                "time": time,
                "num_samples": time_len
            },
            "filename": "100"
        })
        .to_string()
    }

    #[test]
    fn wfdb_response_decodes_to_record() {
        let record = parse_wfdb_response(&wfdb_body(500, 500)).unwrap();
        assert_eq!(record.record_name, "100");
        assert_eq!(record.num_samples, 500);
        assert_eq!(record.signals[0].data.len(), 500);
        assert!((record.duration_secs() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn wfdb_error_carries_details() {
        let body = r#"{"error": "Missing .hea file.", "details": "The .hea file contains metadata."}"#;
        let err = parse_wfdb_response(body).unwrap_err();
        let text = err.display_text();
        assert!(text.contains("Missing .hea file."));
        assert!(text.contains("Details: The .hea file contains metadata."));
    }

    #[test]
    fn wfdb_missing_signals_is_a_precondition_failure() {
        let body = r#"{
            "metadata": {"record_name": "100", "num_signals": 0, "sampling_frequency": 250.0},
            "signal_data": {"signals": [], "time": [0.0], "num_samples": 1}
        }"#;
        assert!(matches!(
            parse_wfdb_response(body),
            Err(UploadError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn wfdb_length_mismatch_is_rejected() {
        let err = parse_wfdb_response(&wfdb_body(500, 499)).unwrap_err();
        match err {
            UploadError::MalformedResponse { message, .. } => {
                assert!(message.contains("499"));
                assert!(message.contains("500"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn wfdb_missing_metadata_is_rejected() {
        let body = r#"{"signal_data": {"signals": [], "time": [], "num_samples": 0}}"#;
        assert!(matches!(
            parse_wfdb_response(body),
            Err(UploadError::MalformedResponse { .. })
        ));
    }
}
