use std::time::Instant;

use eframe::egui::{self, Color32, RichText};

use bike_panda::config::Config;
use bike_panda::data::cache::DatasetCache;
use bike_panda::error::DataError;
use bike_panda::state::AppState;

use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

enum Screen {
    Dashboard {
        cache: DatasetCache,
        state: AppState,
    },
    /// The initial load failed; nothing but the message is rendered.
    Failed(String),
}

pub struct BikePandaApp {
    config: Config,
    screen: Screen,
    last_source_check: Instant,
}

impl BikePandaApp {
    pub fn new(config: Config, loaded: Result<DatasetCache, DataError>) -> Self {
        let screen = match loaded {
            Ok(cache) => {
                let state = AppState::new(cache.snapshot(), config.preview_rows);
                Screen::Dashboard { cache, state }
            }
            Err(e) => Screen::Failed(e.to_string()),
        };
        Self {
            config,
            screen,
            last_source_check: Instant::now(),
        }
    }

    /// Reload the snapshot when the source file changed on disk.
    fn poll_source(&mut self) {
        let Some(interval) = self.config.reload_interval() else {
            return;
        };
        if self.last_source_check.elapsed() < interval {
            return;
        }
        self.last_source_check = Instant::now();

        if let Screen::Dashboard { cache, state } = &mut self.screen {
            match cache.refresh() {
                Ok(true) => state.set_dataset(cache.snapshot()),
                Ok(false) => {}
                Err(e) => {
                    log::error!("Reload failed: {e}");
                    state.status_message = Some(format!("Reload failed: {e}"));
                }
            }
        }
    }
}

impl eframe::App for BikePandaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_source();
        if let Some(interval) = self.config.reload_interval() {
            ctx.request_repaint_after(interval);
        }

        let (cache, state) = match &mut self.screen {
            Screen::Dashboard { cache, state } => (cache, state),
            Screen::Failed(message) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.centered_and_justified(|ui| {
                        ui.label(
                            RichText::new(format!(
                                "{message}\n\nMake sure the dataset exists and pass its path on the command line."
                            ))
                            .color(Color32::RED)
                            .size(18.0),
                        );
                    });
                });
                return;
            }
        };

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, cache, state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, state);
            });

        // ---- Central panel: charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    plot::dashboard(ui, state);
                });
        });
    }
}
