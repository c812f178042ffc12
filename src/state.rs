use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};

use eframe::egui;

use crate::data::model::{EcgRecord, UploadedFile};
use crate::data::normalize::class_labels;
use crate::data::selection::Selection;
use crate::render::LeadSelection;
use crate::style::{StyleField, StyleRegistry};
use crate::upload::{self, UploadEvent, UploadOutcome};

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Typed UI commands. Panels collect these during a frame and the app
/// dispatches them afterwards, so every render reflects the state after the
/// most recently dispatched command.
#[derive(Debug, Clone)]
pub enum Command {
    UploadCsv(Vec<PathBuf>),
    UploadWfdb(Vec<PathBuf>),
    ToggleRow { file: usize, row: usize },
    SelectAllRows { file: usize },
    DeselectAllRows { file: usize },
    /// Pick which class the style controls of a file edit.
    FocusClass { file: usize, label: String },
    SetClassStyle { label: String, field: StyleField },
    ResetFileStyles { file: usize },
    SetLead(LeadSelection),
    SetWindowSize(f64),
    SetStartTime(f64),
    ShowFullTrace,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering. Lives for the whole
/// session; only explicit user actions mutate it.
pub struct AppState {
    /// Base URL of the parsing server.
    pub server_url: String,

    /// Uploaded CSV files of the current session, in selection order.
    pub files: Vec<UploadedFile>,

    /// One selection per file, index-aligned with `files`.
    pub selections: Vec<Selection>,

    /// Which class label each file's style controls currently edit.
    pub style_focus: Vec<String>,

    /// Shared class-label → style mapping.
    pub styles: StyleRegistry,

    /// Loaded WFDB record (None until a successful upload).
    pub ecg: Option<EcgRecord>,

    pub lead: LeadSelection,
    pub window_size: f64,
    pub start_time: f64,
    /// False shows the downsampled full-trace overview; any signal control
    /// change switches to the full-resolution window.
    pub windowed: bool,

    /// Inline error text for the CSV section.
    pub csv_error: Option<String>,
    /// Inline error text for the ECG section.
    pub ecg_error: Option<String>,

    /// Whether a CSV batch is in flight.
    pub csv_uploading: bool,
    /// Whether a WFDB upload is in flight.
    pub wfdb_uploading: bool,

    /// Current upload batch per kind; a result is discarded only when a
    /// newer attempt of the same kind has superseded it. The kinds are
    /// independent: a WFDB upload must not invalidate an in-flight CSV
    /// batch, or vice versa.
    csv_generation: u64,
    wfdb_generation: u64,
    tx: Sender<UploadEvent>,
    rx: Receiver<UploadEvent>,
}

impl Default for AppState {
    fn default() -> Self {
        let (tx, rx) = mpsc::channel();
        AppState {
            server_url: std::env::var("TERNVIEW_SERVER")
                .unwrap_or_else(|_| upload::DEFAULT_SERVER_URL.to_string()),
            files: Vec::new(),
            selections: Vec::new(),
            style_focus: Vec::new(),
            styles: StyleRegistry::default(),
            ecg: None,
            lead: LeadSelection::All,
            window_size: 10.0,
            start_time: 0.0,
            windowed: false,
            csv_error: None,
            ecg_error: None,
            csv_uploading: false,
            wfdb_uploading: false,
            csv_generation: 0,
            wfdb_generation: 0,
            tx,
            rx,
        }
    }
}

impl AppState {
    /// Apply one command. Upload commands spawn a worker thread; everything
    /// else mutates in place.
    pub fn dispatch(&mut self, command: Command, ctx: &egui::Context) {
        match command {
            Command::UploadCsv(paths) => self.start_csv_upload(paths, ctx),
            Command::UploadWfdb(paths) => self.start_wfdb_upload(paths, ctx),

            Command::ToggleRow { file, row } => {
                if let Some(selection) = self.selections.get_mut(file) {
                    selection.toggle(row);
                }
            }
            Command::SelectAllRows { file } => {
                if let Some(selection) = self.selections.get_mut(file) {
                    selection.select_all();
                }
            }
            Command::DeselectAllRows { file } => {
                if let Some(selection) = self.selections.get_mut(file) {
                    selection.deselect_all();
                }
            }

            Command::FocusClass { file, label } => {
                if let Some(focus) = self.style_focus.get_mut(file) {
                    *focus = label;
                }
            }
            Command::SetClassStyle { label, field } => {
                self.styles.update(&label, field);
            }
            Command::ResetFileStyles { file } => {
                if let Some(f) = self.files.get(file) {
                    self.styles.reset(&class_labels(f));
                }
            }

            Command::SetLead(lead) => {
                self.lead = lead;
                self.windowed = true;
            }
            Command::SetWindowSize(size) => {
                self.window_size = size.clamp(1.0, self.window_limit());
                self.start_time = self.start_time.min(self.start_limit());
                self.windowed = true;
            }
            Command::SetStartTime(start) => {
                self.start_time = start.clamp(0.0, self.start_limit());
                self.windowed = true;
            }
            Command::ShowFullTrace => {
                self.windowed = false;
            }
        }
    }

    /// Drain finished uploads from the worker channel. Stale batches
    /// (superseded by a newer upload attempt of the same kind) are
    /// dropped unseen.
    pub fn poll_uploads(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            match event.outcome {
                UploadOutcome::CsvBatch(result) => {
                    if event.generation != self.csv_generation {
                        log::debug!("discarding result of superseded CSV batch");
                        continue;
                    }
                    self.csv_uploading = false;
                    match result {
                        Ok(files) => self.replace_files(files),
                        Err(err) => {
                            log::error!("CSV upload failed: {err}");
                            self.csv_error = Some(err.display_text());
                        }
                    }
                }
                UploadOutcome::Wfdb(result) => {
                    if event.generation != self.wfdb_generation {
                        log::debug!("discarding result of superseded WFDB upload");
                        continue;
                    }
                    self.wfdb_uploading = false;
                    match *result {
                        Ok(record) => self.set_record(record),
                        Err(err) => {
                            log::error!("WFDB upload failed: {err}");
                            self.ecg_error = Some(err.display_text());
                        }
                    }
                }
            }
        }
    }

    /// Whether any upload is in flight.
    pub fn is_uploading(&self) -> bool {
        self.csv_uploading || self.wfdb_uploading
    }

    fn start_csv_upload(&mut self, paths: Vec<PathBuf>, ctx: &egui::Context) {
        // The store is cleared at the start of every attempt: whole batch
        // or nothing.
        self.files.clear();
        self.selections.clear();
        self.style_focus.clear();
        self.csv_error = None;

        if let Err(err) = upload::validate_csv_selection(&paths) {
            self.csv_error = Some(err.display_text());
            return;
        }

        self.csv_generation += 1;
        self.csv_uploading = true;
        upload::spawn_csv_upload(
            self.tx.clone(),
            ctx.clone(),
            self.server_url.clone(),
            paths,
            self.csv_generation,
        );
    }

    fn start_wfdb_upload(&mut self, paths: Vec<PathBuf>, ctx: &egui::Context) {
        self.ecg_error = None;

        if let Err(err) = upload::validate_wfdb_selection(&paths) {
            self.ecg_error = Some(err.display_text());
            return;
        }

        self.wfdb_generation += 1;
        self.wfdb_uploading = true;
        upload::spawn_wfdb_upload(
            self.tx.clone(),
            ctx.clone(),
            self.server_url.clone(),
            paths,
            self.wfdb_generation,
        );
    }

    /// Install a successful CSV batch: all-true selections, default styles
    /// for unseen classes, style focus on each file's first class.
    fn replace_files(&mut self, files: Vec<UploadedFile>) {
        self.selections = files.iter().map(|f| Selection::all(f.len())).collect();
        self.style_focus = files
            .iter()
            .map(|f| class_labels(f).into_iter().next().unwrap_or_default())
            .collect();
        for file in &files {
            self.styles.ensure_defaults(&class_labels(file));
        }
        log::info!(
            "loaded {} CSV file(s): {:?}",
            files.len(),
            files.iter().map(|f| f.file_name.as_str()).collect::<Vec<_>>()
        );
        self.files = files;
        self.csv_error = None;
    }

    /// Install a successful WFDB record and reset the view controls.
    fn set_record(&mut self, record: EcgRecord) {
        log::info!(
            "loaded record '{}': {} signal(s), {} samples at {} Hz",
            record.record_name,
            record.signals.len(),
            record.num_samples,
            record.sampling_frequency
        );
        let duration = record.duration_secs();
        self.window_size = duration.floor().min(10.0).max(1.0);
        self.start_time = 0.0;
        self.lead = LeadSelection::All;
        self.windowed = false;
        self.ecg = Some(record);
        self.ecg_error = None;
    }

    /// Largest allowed time window, capped at 60 s.
    pub fn window_limit(&self) -> f64 {
        self.ecg
            .as_ref()
            .map(|r| r.duration_secs().floor().clamp(1.0, 60.0))
            .unwrap_or(10.0)
    }

    /// Largest allowed start time for the current window size.
    pub fn start_limit(&self) -> f64 {
        self.ecg
            .as_ref()
            .map(|r| (r.duration_secs() - self.window_size).floor().max(0.0))
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Row, SignalTrace};
    use crate::style::DEFAULT_COLORS;

    fn ctx() -> egui::Context {
        egui::Context::default()
    }

    fn csv_file(name: &str, classes: &[&str]) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            rows: classes
                .iter()
                .map(|class| Row {
                    title: "p".into(),
                    class: class.to_string(),
                    value1: CellValue::Number(1.0),
                    value2: CellValue::Number(1.0),
                    value3: CellValue::Number(1.0),
                })
                .collect(),
            column_names: Default::default(),
        }
    }

    fn record(num_samples: usize, fs: f64) -> EcgRecord {
        EcgRecord {
            record_name: "rec".into(),
            sampling_frequency: fs,
            num_signals: 1,
            num_samples,
            time: (0..num_samples).map(|i| i as f64 / fs).collect(),
            signals: vec![SignalTrace {
                name: "I".into(),
                unit: "mV".into(),
                data: vec![0.0; num_samples],
            }],
        }
    }

    #[test]
    fn replace_files_initializes_selections_and_styles() {
        let mut state = AppState::default();
        state.replace_files(vec![csv_file("a.csv", &["A", "B"]), csv_file("b.csv", &["B"])]);
        assert_eq!(state.selections.len(), 2);
        assert_eq!(state.selections[0].count(), (2, 2));
        assert_eq!(state.style_focus, vec!["A".to_string(), "B".to_string()]);
        // "B" keeps the entry it got from the first file.
        assert_eq!(state.styles.style_for("B").color, DEFAULT_COLORS[1]);
    }

    #[test]
    fn toggle_and_bulk_selection_commands() {
        let mut state = AppState::default();
        state.replace_files(vec![csv_file("a.csv", &["A", "A", "A"])]);

        state.dispatch(Command::ToggleRow { file: 0, row: 1 }, &ctx());
        assert_eq!(state.selections[0].count(), (2, 3));

        state.dispatch(Command::DeselectAllRows { file: 0 }, &ctx());
        assert_eq!(state.selections[0].count(), (0, 3));

        state.dispatch(Command::SelectAllRows { file: 0 }, &ctx());
        assert_eq!(state.selections[0].count(), (3, 3));
    }

    #[test]
    fn commands_for_missing_files_are_ignored() {
        let mut state = AppState::default();
        state.dispatch(Command::ToggleRow { file: 3, row: 0 }, &ctx());
        state.dispatch(Command::ResetFileStyles { file: 3 }, &ctx());
    }

    #[test]
    fn reset_styles_only_touches_the_files_labels() {
        let mut state = AppState::default();
        state.replace_files(vec![csv_file("a.csv", &["A"]), csv_file("b.csv", &["Z"])]);
        state.dispatch(
            Command::SetClassStyle {
                label: "A".into(),
                field: StyleField::Size(19),
            },
            &ctx(),
        );
        state.dispatch(
            Command::SetClassStyle {
                label: "Z".into(),
                field: StyleField::Size(19),
            },
            &ctx(),
        );
        state.dispatch(Command::ResetFileStyles { file: 1 }, &ctx());
        assert_eq!(state.styles.style_for("A").size, 19);
        assert_eq!(state.styles.style_for("Z").size, crate::style::DEFAULT_SIZE);
    }

    #[test]
    fn set_record_resets_the_view_controls() {
        let mut state = AppState::default();
        state.windowed = true;
        state.set_record(record(25_000, 250.0)); // 100 s
        assert!(!state.windowed);
        assert_eq!(state.window_size, 10.0);
        assert_eq!(state.start_time, 0.0);
        assert_eq!(state.window_limit(), 60.0);
        assert_eq!(state.start_limit(), 90.0);
    }

    #[test]
    fn short_records_shrink_the_default_window() {
        let mut state = AppState::default();
        state.set_record(record(750, 250.0)); // 3 s
        assert_eq!(state.window_size, 3.0);
        assert_eq!(state.window_limit(), 3.0);
    }

    #[test]
    fn window_commands_clamp_and_switch_to_windowed_view() {
        let mut state = AppState::default();
        state.set_record(record(25_000, 250.0)); // 100 s

        state.dispatch(Command::SetWindowSize(500.0), &ctx());
        assert_eq!(state.window_size, 60.0);
        assert!(state.windowed);

        state.dispatch(Command::SetStartTime(99.0), &ctx());
        assert_eq!(state.start_time, 40.0);

        state.dispatch(Command::ShowFullTrace, &ctx());
        assert!(!state.windowed);
    }

    #[test]
    fn start_time_is_pulled_back_when_the_window_grows() {
        let mut state = AppState::default();
        state.set_record(record(25_000, 250.0)); // 100 s
        state.dispatch(Command::SetStartTime(85.0), &ctx());
        assert_eq!(state.start_time, 85.0);
        state.dispatch(Command::SetWindowSize(40.0), &ctx());
        assert_eq!(state.start_time, 60.0);
    }

    #[test]
    fn empty_csv_selection_is_rejected_before_any_request() {
        let mut state = AppState::default();
        state.dispatch(Command::UploadCsv(Vec::new()), &ctx());
        assert!(!state.is_uploading());
        assert!(state.csv_error.is_some());
    }

    #[test]
    fn wrong_wfdb_extension_is_rejected_before_any_request() {
        let mut state = AppState::default();
        state.dispatch(
            Command::UploadWfdb(vec![PathBuf::from("notes.txt")]),
            &ctx(),
        );
        assert!(!state.is_uploading());
        assert!(state.ecg_error.is_some());
    }

    #[test]
    fn upload_attempt_clears_the_store() {
        let mut state = AppState::default();
        state.replace_files(vec![csv_file("a.csv", &["A"])]);
        // Even a rejected attempt empties the store first.
        state.dispatch(Command::UploadCsv(Vec::new()), &ctx());
        assert!(state.files.is_empty());
        assert!(state.selections.is_empty());
    }

    #[test]
    fn stale_upload_results_are_discarded() {
        let mut state = AppState::default();
        state.csv_generation = 5;
        state.csv_uploading = true;
        state
            .tx
            .clone()
            .send(UploadEvent {
                generation: 4,
                outcome: UploadOutcome::CsvBatch(Ok(vec![csv_file("old.csv", &["A"])])),
            })
            .unwrap();
        state.poll_uploads();
        assert!(state.files.is_empty());
        assert!(state.csv_uploading);
    }

    #[test]
    fn current_upload_results_are_installed() {
        let mut state = AppState::default();
        state.csv_generation = 5;
        state.csv_uploading = true;
        state
            .tx
            .clone()
            .send(UploadEvent {
                generation: 5,
                outcome: UploadOutcome::CsvBatch(Ok(vec![csv_file("new.csv", &["A"])])),
            })
            .unwrap();
        state.poll_uploads();
        assert_eq!(state.files.len(), 1);
        assert!(!state.csv_uploading);
    }

    #[test]
    fn wfdb_upload_does_not_supersede_an_inflight_csv_batch() {
        // Both kinds in flight at once; each result lands against its own
        // generation counter, even though the WFDB attempt started later
        // and its counter would be "newer" under a shared count.
        let mut state = AppState::default();
        state.csv_generation = 1;
        state.csv_uploading = true;
        state.wfdb_generation = 1;
        state.wfdb_uploading = true;

        let tx = state.tx.clone();
        tx.send(UploadEvent {
            generation: 1,
            outcome: UploadOutcome::CsvBatch(Ok(vec![csv_file("a.csv", &["A"])])),
        })
        .unwrap();
        tx.send(UploadEvent {
            generation: 1,
            outcome: UploadOutcome::Wfdb(Box::new(Ok(record(750, 250.0)))),
        })
        .unwrap();

        state.poll_uploads();
        assert_eq!(state.files.len(), 1);
        assert!(state.ecg.is_some());
        assert!(state.csv_error.is_none());
        assert!(state.ecg_error.is_none());
        assert!(!state.is_uploading());
    }
}
