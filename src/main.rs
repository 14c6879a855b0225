mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::Path;

use app::FermCurveApp;
use config::{AppConfig, CONFIG_FILENAME};
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::load_or_default(Path::new(CONFIG_FILENAME));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "FermCurve – Batch Comparator",
        options,
        Box::new(|_cc| Ok(Box::new(FermCurveApp::new(config)))),
    )
}
