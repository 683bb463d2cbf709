use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use bike_panda::data::loader::{COUNT, DATETIME, SEASON, WEATHER, WORKINGDAY};
use bike_panda::data::model::{weekday_name, EnrichedRecord};
use bike_panda::state::AppState;

const DERIVED: [&str; 7] = [
    "year",
    "month",
    "day_of_week",
    "hour",
    "day_period",
    "season_label",
    "weather_label",
];

fn covariate_columns(state: &AppState) -> Vec<&str> {
    state
        .dataset
        .source_columns
        .iter()
        .map(String::as_str)
        .filter(|c| ![SEASON, WEATHER, WORKINGDAY, COUNT].contains(c))
        .collect()
}

fn cells(rec: &EnrichedRecord, covariates: &[&str]) -> Vec<String> {
    let mut out = vec![
        rec.raw.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        rec.raw.season.to_string(),
        rec.raw.weather.to_string(),
        u8::from(rec.raw.working_day).to_string(),
    ];
    out.extend(covariates.iter().map(|c| match rec.raw.covariates.get(*c) {
        Some(v) if v.is_finite() => format!("{v:.2}"),
        _ => "NaN".to_string(),
    }));
    out.push(rec.raw.count.to_string());
    out.extend([
        rec.year.to_string(),
        rec.month.to_string(),
        weekday_name(rec.day_of_week).to_string(),
        rec.hour.to_string(),
        rec.day_period.to_string(),
        rec.season_label.to_string(),
        rec.weather_label.to_string(),
    ]);
    out
}

/// Table of the first `preview_rows` filtered records.
pub fn raw_preview(ui: &mut Ui, state: &AppState) {
    let covariates = covariate_columns(state);
    let mut headers: Vec<&str> = vec![DATETIME, SEASON, WEATHER, WORKINGDAY];
    headers.extend(covariates.iter().copied());
    headers.push(COUNT);
    headers.extend(DERIVED);

    let rows: Vec<Vec<String>> = state.preview().map(|r| cells(r, &covariates)).collect();
    ui.label(format!(
        "Showing {} of {} filtered rows",
        rows.len(),
        state.view.visible_indices.len()
    ));

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(320.0)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .columns(Column::auto().at_least(40.0), headers.len())
        .header(20.0, |mut header| {
            for h in &headers {
                header.col(|ui: &mut Ui| {
                    ui.strong(*h);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let values = &rows[row.index()];
                for v in values {
                    row.col(|ui: &mut Ui| {
                        ui.label(v.as_str());
                    });
                }
            });
        });
}
