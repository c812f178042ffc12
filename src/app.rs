use eframe::egui;

use crate::state::{AppState, Command};
use crate::ui::panels;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct TernViewApp {
    pub state: AppState,
}

impl Default for TernViewApp {
    fn default() -> Self {
        Self {
            state: AppState::default(),
        }
    }
}

impl eframe::App for TernViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_uploads();

        // Panels read the state and emit commands; dispatch happens after
        // the frame so the next render sees the state after the last one.
        let mut commands: Vec<Command> = Vec::new();

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &self.state, &mut commands);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    panels::signal_section(ui, &self.state, &mut commands);
                    ui.separator();
                    panels::csv_section(ui, &self.state, &mut commands);
                });
        });

        for command in commands {
            self.state.dispatch(command, ctx);
        }
    }
}
