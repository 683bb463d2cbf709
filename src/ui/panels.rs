use anyhow::Context;
use eframe::egui::{self, Color32, RichText, Ui};

use bike_panda::data::cache::DatasetCache;
use bike_panda::data::filter::DayType;
use bike_panda::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Options");
    ui.separator();

    // ---- Years (multi-select) ----
    ui.strong("Select Year(s):");
    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.select_all_years();
        }
        if ui.small_button("None").clicked() {
            state.select_no_years();
        }
    });
    let years: Vec<i32> = state.dataset.years.iter().copied().collect();
    for year in years {
        let mut checked = state.filters.years.contains(&year);
        if ui.checkbox(&mut checked, year.to_string()).changed() {
            state.toggle_year(year);
        }
    }
    ui.separator();

    // ---- Seasons (multi-select) ----
    ui.strong("Select Season(s):");
    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.select_all_seasons();
        }
        if ui.small_button("None").clicked() {
            state.select_no_seasons();
        }
    });
    let seasons: Vec<_> = state.dataset.seasons.iter().copied().collect();
    for season in seasons {
        let mut checked = state.filters.seasons.contains(&season);
        if ui.checkbox(&mut checked, season.label()).changed() {
            state.toggle_season(season);
        }
    }
    ui.separator();

    // ---- Day type (radio) ----
    ui.strong("Filter Day Type:");
    for day_type in DayType::ALL {
        if ui
            .radio(state.filters.day_type == day_type, day_type.label())
            .clicked()
        {
            state.set_day_type(day_type);
        }
    }
    ui.separator();

    ui.label(format!(
        "{} of {} hours selected",
        state.view.visible_indices.len(),
        state.dataset.len()
    ));
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, cache: &mut DatasetCache, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(cache, state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                reload(cache, state);
                ui.close_menu();
            }
        });

        ui.separator();
        ui.label(cache.path().display().to_string());

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

/// Explicit cache invalidation.
fn reload(cache: &mut DatasetCache, state: &mut AppState) {
    match cache.invalidate() {
        Ok(()) => state.set_dataset(cache.snapshot()),
        Err(e) => {
            log::error!("Reload failed: {e}");
            state.status_message = Some(format!("Error: {e}"));
        }
    }
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(cache: &mut DatasetCache, state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open rental data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        let loaded = DatasetCache::load(path.clone())
            .with_context(|| format!("loading {}", path.display()));
        match loaded {
            Ok(fresh) => {
                *cache = fresh;
                state.set_dataset(cache.snapshot());
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
