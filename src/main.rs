mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use app::DisasterDashApp;
use eframe::egui;
use state::AppState;

/// Overrides the dataset path when no CLI argument is given.
const DATA_ENV_VAR: &str = "DISASTER_DASH_DATA";
const DEFAULT_DATA_FILE: &str = "public_emdat_2024-10-29.csv";

/// First CLI argument, else `$DISASTER_DASH_DATA`, else the default export name.
fn data_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(DATA_ENV_VAR))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
}

fn main() -> eframe::Result {
    env_logger::init();

    let mut state = AppState::default();
    let path = data_path();
    if path.exists() {
        state.open(&path);
    } else {
        log::warn!("No dataset at {}; use File → Open…", path.display());
        state.status_message = Some(format!("{} not found", path.display()));
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Disaster Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DisasterDashApp::new(state)))),
    )
}
