mod app;
mod color;
mod state;
mod ui;

use std::path::{Path, PathBuf};

use app::TankAnalyzerApp;
use eframe::egui;
use tank_analyzer::EngineConfig;

/// Path to a JSON engine configuration; defaults apply when unset.
const CONFIG_ENV: &str = "TANK_ANALYZER_CONFIG";

fn main() -> eframe::Result {
    env_logger::init();

    let config = load_config();
    // An optional CSV path on the command line is opened at startup.
    let initial_file = std::env::args_os().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Tank Analyzer – extracted kg per tank and material",
        options,
        Box::new(move |_cc| Ok(Box::new(TankAnalyzerApp::new(config, initial_file.as_deref())))),
    )
}

fn load_config() -> EngineConfig {
    let Some(path) = std::env::var_os(CONFIG_ENV) else {
        return EngineConfig::default();
    };
    match EngineConfig::from_json_file(Path::new(&path)) {
        Ok(config) => {
            log::info!("using configuration from {}", Path::new(&path).display());
            config
        }
        Err(e) => {
            log::error!("{e}; falling back to the built-in configuration");
            EngineConfig::default()
        }
    }
}
