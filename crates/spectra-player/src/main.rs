mod analyser;
mod app;
mod config;
mod decode;
mod playback;
mod transport;
mod ui;

use eframe::egui;
use eframe::NativeOptions;

use crate::app::PlayerApp;

fn main() -> eframe::Result<()> {
    // RUST_LOG=debug for verbose output.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let native_options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([640.0, 300.0])
            .with_min_inner_size([420.0, 240.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Spectra",
        native_options,
        Box::new(|_cc| Ok(Box::new(PlayerApp::default()))),
    )
}
