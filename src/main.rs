mod app;
mod color;
mod ui;

use app::BikePandaApp;
use bike_panda::config::Config;
use bike_panda::data::cache::DatasetCache;
use clap::Parser;
use eframe::egui;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::parse();

    // Load eagerly; on failure the app shows the error and nothing else.
    let loaded = DatasetCache::load(config.data.clone());
    if let Err(e) = &loaded {
        log::error!("Failed to load dataset: {e}");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Bike Sharing Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(BikePandaApp::new(config, loaded)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
