use eframe::egui::{self, Color32, RichText, Slider, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{EcgRecord, UploadedFile};
use crate::data::normalize::class_labels;
use crate::data::selection::Selection;
use crate::render::{self, LeadSelection, MAX_OVERVIEW_POINTS};
use crate::state::{AppState, Command};
use crate::style::{self, StyleField, DEFAULT_SYMBOLS, MAX_SIZE, MIN_SIZE};
use crate::ui::plot;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &AppState, commands: &mut Vec<Command>) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Upload CSV…").clicked() {
                if let Some(paths) = pick_csv_files() {
                    commands.push(Command::UploadCsv(paths));
                }
                ui.close_menu();
            }
            if ui.button("Upload WFDB…").clicked() {
                if let Some(paths) = pick_wfdb_files() {
                    commands.push(Command::UploadWfdb(paths));
                }
                ui.close_menu();
            }
        });

        ui.separator();

        if !state.files.is_empty() {
            ui.label(format!("{} CSV file(s) loaded", state.files.len()));
        }
        if let Some(record) = &state.ecg {
            ui.label(format!("Record: {}", record.record_name));
        }

        if state.is_uploading() {
            ui.separator();
            ui.spinner();
            ui.label("Uploading…");
        }
    });
}

fn pick_csv_files() -> Option<Vec<std::path::PathBuf>> {
    rfd::FileDialog::new()
        .set_title("Upload CSV files")
        .add_filter("CSV", &["csv"])
        .pick_files()
}

fn pick_wfdb_files() -> Option<Vec<std::path::PathBuf>> {
    rfd::FileDialog::new()
        .set_title("Upload WFDB files")
        .add_filter("WFDB", &["dat", "hea"])
        .pick_files()
}

/// Inline error panel used by both sections.
fn error_panel(ui: &mut Ui, text: &str) {
    ui.group(|ui: &mut Ui| {
        ui.colored_label(Color32::RED, text);
    });
}

// ---------------------------------------------------------------------------
// ECG section
// ---------------------------------------------------------------------------

/// Render the WFDB signal section: view controls, chart, and record info.
pub fn signal_section(ui: &mut Ui, state: &AppState, commands: &mut Vec<Command>) {
    ui.heading("ECG Signals");

    if let Some(err) = &state.ecg_error {
        error_panel(ui, err);
    }

    let Some(record) = &state.ecg else {
        ui.label("Upload WFDB files (.dat + .hea) to view a record.  (File → Upload WFDB…)");
        return;
    };

    signal_controls(ui, state, record, commands);

    let chart = if state.windowed {
        render::signal_window(record, state.start_time, state.window_size, state.lead)
    } else {
        render::signal_overview(record, MAX_OVERVIEW_POINTS)
    };
    if chart.series.iter().all(|s| s.points.is_empty()) {
        error_panel(ui, "No samples in the selected window.");
    } else {
        plot::signal_plot(ui, &chart);
    }

    record_info(ui, record);
}

fn signal_controls(ui: &mut Ui, state: &AppState, record: &EcgRecord, commands: &mut Vec<Command>) {
    ui.horizontal(|ui: &mut Ui| {
        // ---- Lead selector ----
        let selected_text = match state.lead {
            LeadSelection::All => "All Leads".to_string(),
            LeadSelection::One(idx) => record
                .signals
                .get(idx)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| format!("Signal {idx}")),
        };
        egui::ComboBox::from_label("Lead")
            .selected_text(selected_text)
            .show_ui(ui, |ui: &mut Ui| {
                if ui
                    .selectable_label(state.lead == LeadSelection::All, "All Leads")
                    .clicked()
                {
                    commands.push(Command::SetLead(LeadSelection::All));
                }
                for (idx, sig) in record.signals.iter().enumerate() {
                    if ui
                        .selectable_label(state.lead == LeadSelection::One(idx), &sig.name)
                        .clicked()
                    {
                        commands.push(Command::SetLead(LeadSelection::One(idx)));
                    }
                }
            });

        ui.separator();

        // ---- Time window ----
        let mut window = state.window_size;
        if ui
            .add(
                Slider::new(&mut window, 1.0..=state.window_limit())
                    .fixed_decimals(0)
                    .text("Window (s)"),
            )
            .changed()
        {
            commands.push(Command::SetWindowSize(window));
        }

        let mut start = state.start_time;
        if ui
            .add(
                Slider::new(&mut start, 0.0..=state.start_limit())
                    .fixed_decimals(0)
                    .text("Start (s)"),
            )
            .changed()
        {
            commands.push(Command::SetStartTime(start));
        }

        ui.separator();

        if ui
            .selectable_label(!state.windowed, "Full trace")
            .clicked()
        {
            commands.push(Command::ShowFullTrace);
        }
    });
}

/// Record metadata and per-signal amplitude summary.
fn record_info(ui: &mut Ui, record: &EcgRecord) {
    egui::CollapsingHeader::new(RichText::new("Record information").strong())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("record_meta").num_columns(2).show(ui, |ui: &mut Ui| {
                ui.strong("Record name");
                ui.label(&record.record_name);
                ui.end_row();
                ui.strong("Number of signals");
                ui.label(record.num_signals.to_string());
                ui.end_row();
                ui.strong("Sampling frequency");
                ui.label(format!("{} Hz", record.sampling_frequency));
                ui.end_row();
                ui.strong("Record duration");
                ui.label(format!("{:.2} seconds", record.duration_secs()));
                ui.end_row();
                ui.strong("Number of samples");
                ui.label(record.num_samples.to_string());
                ui.end_row();
            });

            ui.add_space(6.0);
            ui.strong("Signal information");

            egui::Grid::new("signal_stats")
                .num_columns(5)
                .striped(true)
                .show(ui, |ui: &mut Ui| {
                    ui.strong("Name");
                    ui.strong("Unit");
                    ui.strong("Max");
                    ui.strong("Min");
                    ui.strong("Mean");
                    ui.end_row();

                    // The summary table lists at most ten signals; the
                    // chart still draws every lead.
                    for sig in record.signals.iter().take(10) {
                        let Some(stats) = sig.stats() else { continue };
                        ui.label(&sig.name);
                        ui.label(&sig.unit);
                        ui.label(format!("{:.3}", stats.max));
                        ui.label(format!("{:.3}", stats.min));
                        ui.label(format!("{:.3}", stats.mean));
                        ui.end_row();
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// CSV section
// ---------------------------------------------------------------------------

/// Render the ternary CSV section: one sub-section per uploaded file.
pub fn csv_section(ui: &mut Ui, state: &AppState, commands: &mut Vec<Command>) {
    ui.heading("Ternary CSV Files");

    if let Some(err) = &state.csv_error {
        error_panel(ui, err);
    }

    if state.files.is_empty() {
        ui.label("Upload CSV files to view ternary plots.  (File → Upload CSV…)");
        return;
    }

    for (file_index, file) in state.files.iter().enumerate() {
        let Some(selection) = state.selections.get(file_index) else {
            continue;
        };
        file_section(ui, state, file, selection, file_index, commands);
    }
}

fn file_section(
    ui: &mut Ui,
    state: &AppState,
    file: &UploadedFile,
    selection: &Selection,
    file_index: usize,
    commands: &mut Vec<Command>,
) {
    egui::CollapsingHeader::new(RichText::new(format!("File: {}", file.file_name)).strong())
        .id_salt(("csv_file", file_index))
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.columns(2, |columns: &mut [Ui]| {
                row_table(&mut columns[0], file, selection, file_index, commands);
                let right = &mut columns[1];
                style_controls(right, state, file, file_index, commands);
                let chart = render::ternary_chart(file, selection, &state.styles);
                plot::ternary_plot(right, &chart, file_index);
            });
        });
}

/// Left half of a file section: the row table with selection checkboxes.
fn row_table(
    ui: &mut Ui,
    file: &UploadedFile,
    selection: &Selection,
    file_index: usize,
    commands: &mut Vec<Command>,
) {
    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("Select All").clicked() {
            commands.push(Command::SelectAllRows { file: file_index });
        }
        if ui.small_button("Deselect All").clicked() {
            commands.push(Command::DeselectAllRows { file: file_index });
        }
        let (selected, total) = selection.count();
        ui.label(format!("Selected: {selected} / {total} points"));
    });

    let names = &file.column_names;
    let headers = [
        names.title.as_str(),
        names.class.as_str(),
        names.value1.as_str(),
        names.value2.as_str(),
        names.value3.as_str(),
    ];

    ui.push_id(("row_table", file_index), |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto())
            .columns(Column::remainder(), headers.len())
            .max_scroll_height(360.0)
            .header(20.0, |mut header| {
                header.col(|_ui| {});
                for title in headers {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, file.rows.len(), |mut table_row| {
                    let row_index = table_row.index();
                    let row = &file.rows[row_index];
                    table_row.col(|ui| {
                        let mut checked = selection.is_selected(row_index);
                        if ui.checkbox(&mut checked, "").changed() {
                            commands.push(Command::ToggleRow {
                                file: file_index,
                                row: row_index,
                            });
                        }
                    });
                    table_row.col(|ui| {
                        ui.label(&row.title);
                    });
                    table_row.col(|ui| {
                        ui.label(&row.class);
                    });
                    table_row.col(|ui| {
                        ui.label(row.value1.to_string());
                    });
                    table_row.col(|ui| {
                        ui.label(row.value2.to_string());
                    });
                    table_row.col(|ui| {
                        ui.label(row.value3.to_string());
                    });
                });
            });
    });
}

/// Per-file style controls editing the shared registry.
fn style_controls(
    ui: &mut Ui,
    state: &AppState,
    file: &UploadedFile,
    file_index: usize,
    commands: &mut Vec<Command>,
) {
    let labels = class_labels(file);
    if labels.is_empty() {
        return;
    }

    let focus = state
        .style_focus
        .get(file_index)
        .cloned()
        .unwrap_or_else(|| labels[0].clone());
    let style = state.styles.style_for(&focus);

    ui.strong("Plot style");
    ui.horizontal_wrapped(|ui: &mut Ui| {
        egui::ComboBox::from_id_salt(("class_selector", file_index))
            .selected_text(&focus)
            .show_ui(ui, |ui: &mut Ui| {
                for label in &labels {
                    if ui.selectable_label(&focus == label, label).clicked() {
                        commands.push(Command::FocusClass {
                            file: file_index,
                            label: label.clone(),
                        });
                    }
                }
            });

        let mut color = style.color;
        if ui.color_edit_button_srgba(&mut color).changed() {
            commands.push(Command::SetClassStyle {
                label: focus.clone(),
                field: StyleField::Color(color),
            });
        }

        egui::ComboBox::from_id_salt(("symbol_selector", file_index))
            .selected_text(style::symbol_name(style.symbol))
            .show_ui(ui, |ui: &mut Ui| {
                for &symbol in &DEFAULT_SYMBOLS {
                    if ui
                        .selectable_label(style.symbol == symbol, style::symbol_name(symbol))
                        .clicked()
                    {
                        commands.push(Command::SetClassStyle {
                            label: focus.clone(),
                            field: StyleField::Symbol(symbol),
                        });
                    }
                }
            });

        let mut size = style.size;
        if ui
            .add(Slider::new(&mut size, MIN_SIZE..=MAX_SIZE).text("Size"))
            .changed()
        {
            commands.push(Command::SetClassStyle {
                label: focus.clone(),
                field: StyleField::Size(size),
            });
        }

        if ui.small_button("Reset Styles").clicked() {
            commands.push(Command::ResetFileStyles { file: file_index });
        }
    });
}
