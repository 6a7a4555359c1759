use eframe::egui;

mod app;
mod download;
mod localizations;
mod models;
mod quality;
mod settings;
mod theme;
mod ui;
mod ytdlp;

use app::FetchApp;
use settings::Settings;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env();
    log::info!(
        "Default destination: {}",
        settings.default_download_dir.display()
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([600.0, 560.0])
            .with_min_inner_size([600.0, 500.0])
            .with_title("Media Downloader"),
        ..Default::default()
    };

    let app = FetchApp::new(settings);

    eframe::run_native(
        "Media Downloader",
        options,
        Box::new(|cc| {
            // Set light theme
            cc.egui_ctx.set_visuals(egui::Visuals::light());
            Box::new(app)
        }),
    )
}
