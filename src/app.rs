use std::path::Path;

use eframe::egui;
use tank_analyzer::EngineConfig;

use crate::state::{AppState, Tab};
use crate::ui::{panels, plot, tables};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct TankAnalyzerApp {
    pub state: AppState,
}

impl TankAnalyzerApp {
    pub fn new(config: EngineConfig, initial_file: Option<&Path>) -> Self {
        let mut state = AppState::new(config);
        if let Some(path) = initial_file {
            state.open(path);
        }
        Self { state }
    }
}

impl eframe::App for TankAnalyzerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: families, day, totals ----
        egui::SidePanel::left("filter_panel")
            .default_width(250.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: tabs ----
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::tab_bar(ui, &mut self.state);
            ui.separator();

            if self.state.dataset.is_none() {
                ui.centered_and_justified(|ui| {
                    ui.heading("Open a tank export to start  (File → Open…)");
                });
                return;
            }

            match self.state.tab {
                Tab::Summary => tables::summary(ui, &self.state),
                Tab::Debug => tables::debug_rows(ui, &self.state),
                Tab::Charts => plot::daily_plot(ui, &self.state),
                Tab::Variations => tables::variations(ui, &mut self.state),
                Tab::Raw => tables::raw_rows(ui, &self.state),
            }
        });
    }
}
