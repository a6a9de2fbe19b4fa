mod app;
mod state;
mod ui;

use app::HofExplorerApp;
use eframe::egui;
use hof_explorer::config::AppConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::error!("Ignoring config: {e:#}");
        AppConfig::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Hall of Fame Enhancers",
        options,
        Box::new(|_cc| Ok(Box::new(HofExplorerApp::new(config)))),
    )
}
