use eframe::egui::{self, Align2, Color32, FontId, Rect, RichText, Sense, Stroke, Ui};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints, Points};

use bike_panda::data::aggregate::{CorrelationMatrix, GroupMeans, Summary};
use bike_panda::data::model::{DayPeriod, FieldValue, GroupField};
use bike_panda::state::{AppState, COLOR_BY_OPTIONS};

use crate::color::{self, ColorMap};
use crate::ui::table;

const PLOT_HEIGHT: f32 = 280.0;
const MONTH_BAR: Color32 = Color32::from_rgb(135, 206, 235);

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render every chart for the current view.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    ui.heading("🚴 Bike Sharing Demand Analysis Dashboard");
    ui.label("Interactive summary of the bike sharing dataset.");
    ui.add_space(6.0);

    metrics(ui, &state.view.summary);
    if state.view.summary.rows == 0 {
        ui.label(RichText::new("No rows match the current filters.").italics());
    }
    ui.separator();

    // ROW 1: Time analysis
    ui.strong("1. Temporal Patterns (Time & Season)");
    ui.columns(2, |cols: &mut [Ui]| {
        hourly_trend(&mut cols[0], &state.view.hourly);
        monthly_trend(&mut cols[1], &state.view.monthly);
    });
    ui.separator();

    // ROW 2: Weather & day period
    ui.strong("2. Weather & Period Analysis");
    color_by_selector(ui, state);
    ui.columns(2, |cols: &mut [Ui]| {
        weather_boxes(&mut cols[0], state);
        day_period_bars(&mut cols[1], &state.view.day_period);
    });
    ui.separator();

    // ROW 3: Correlation & raw data
    ui.strong("3. Correlation Analysis");
    let mut show_heatmap = state.show_heatmap;
    if ui
        .checkbox(&mut show_heatmap, "Show Correlation Matrix Heatmap")
        .changed()
    {
        state.set_show_heatmap(show_heatmap);
    }
    if let Some(matrix) = &state.view.correlation {
        correlation_heatmap(ui, matrix);
    }
    ui.add_space(8.0);

    egui::CollapsingHeader::new("See Raw Data")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            table::raw_preview(ui, state);
        });
}

// ---------------------------------------------------------------------------
// Metric tiles
// ---------------------------------------------------------------------------

/// `1234567` → `"1,234,567"`.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn metrics(ui: &mut Ui, summary: &Summary) {
    let average = summary
        .average_rentals_per_hour
        .map_or_else(|| "–".to_string(), |v| format!("{v:.2}"));
    let max = summary
        .max_rentals_per_hour
        .map_or_else(|| "–".to_string(), format_thousands);

    ui.columns(3, |cols: &mut [Ui]| {
        metric(&mut cols[0], "Total Rentals", &format_thousands(summary.total_rentals));
        metric(&mut cols[1], "Average Rentals/Hour", &average);
        metric(&mut cols[2], "Max Rentals/Hour", &max);
    });
}

fn metric(ui: &mut Ui, title: &str, value: &str) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(title).small());
        ui.label(RichText::new(value).size(28.0).strong());
    });
}

// ---------------------------------------------------------------------------
// Line / bar / box charts
// ---------------------------------------------------------------------------

fn split_name(split: GroupField, value: &Option<FieldValue>) -> String {
    match value {
        Some(v) => format!("{split} = {v}"),
        None => "all".to_string(),
    }
}

fn hourly_trend(ui: &mut Ui, hourly: &GroupMeans) {
    ui.label("Average rentals by hour (0 = non-working, 1 = working)");
    let series = hourly.series();
    let colors = ColorMap::new(series.keys());
    let split = hourly.split.unwrap_or(GroupField::WorkingDay);

    Plot::new("hourly_trend")
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label("Hour")
        .y_axis_label("Average rentals")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (key, points) in &series {
                let name = split_name(split, key);
                let color = colors.color_for(key);
                let xy: Vec<[f64; 2]> = points
                    .iter()
                    .filter_map(|(hour, mean)| Some([hour.as_f64()?, *mean]))
                    .collect();
                plot_ui.line(
                    Line::new(PlotPoints::from(xy.clone()))
                        .name(&name)
                        .color(color)
                        .width(2.0),
                );
                plot_ui.points(Points::new(PlotPoints::from(xy)).name(&name).color(color).radius(3.0));
            }
        });
}

fn monthly_trend(ui: &mut Ui, monthly: &GroupMeans) {
    ui.label("Average rentals by month");
    let bars: Vec<Bar> = monthly
        .means
        .iter()
        .filter_map(|(key, mean)| {
            let month = key.primary.as_f64()?;
            Some(Bar::new(month, *mean).width(0.7).name(format!("month {}", key.primary)))
        })
        .collect();

    Plot::new("monthly_trend")
        .height(PLOT_HEIGHT)
        .x_axis_label("Month")
        .y_axis_label("Average rentals")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(MONTH_BAR).name("Average rentals"));
        });
}

fn weather_boxes(ui: &mut Ui, state: &AppState) {
    ui.label("Rentals distribution by weather");
    let palette = color::generate_palette(state.view.weather.len());

    Plot::new("weather_boxes")
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label("Weather")
        .y_axis_label("Rentals per hour")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, ((weather, stats), color)) in state.view.weather.iter().zip(&palette).enumerate() {
                let x = i as f64;
                let name = weather.to_string();
                let spread = BoxSpread::new(
                    stats.lower_whisker,
                    stats.q1,
                    stats.median,
                    stats.q3,
                    stats.upper_whisker,
                );
                let elem = BoxElem::new(x, spread)
                    .name(&name)
                    .box_width(0.5)
                    .fill(color.gamma_multiply(0.5))
                    .stroke(Stroke::new(1.5, *color));
                plot_ui.box_plot(BoxPlot::new(vec![elem]).name(&name).color(*color));

                if !stats.outliers.is_empty() {
                    let outliers: Vec<[f64; 2]> = stats.outliers.iter().map(|&y| [x, y]).collect();
                    plot_ui.points(
                        Points::new(PlotPoints::from(outliers))
                            .name(&name)
                            .color(*color)
                            .radius(1.5),
                    );
                }
            }
        });
}

fn color_by_selector(ui: &mut Ui, state: &mut AppState) {
    let label = |c: Option<GroupField>| c.map_or("None", GroupField::name);
    let mut selected = state.color_by;
    egui::ComboBox::from_label("Color bars by")
        .selected_text(label(selected))
        .show_ui(ui, |ui: &mut Ui| {
            for option in COLOR_BY_OPTIONS {
                ui.selectable_value(&mut selected, option, label(option));
            }
        });
    if selected != state.color_by {
        state.set_color_by(selected);
    }
}

fn day_period_bars(ui: &mut Ui, day_period: &GroupMeans) {
    let axis: Vec<String> = DayPeriod::ALL
        .iter()
        .map(|p| format!("{} {}", p.index(), p.label()))
        .collect();
    ui.label(format!("Average rentals by day period ({})", axis.join(", ")));

    let series = day_period.series();
    let colors = ColorMap::new(series.keys());
    let width = 0.8 / series.len().max(1) as f64;

    Plot::new("day_period_bars")
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label("Day period")
        .y_axis_label("Average rentals")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, (key, points)) in series.iter().enumerate() {
                let offset = -0.4 + width * (i as f64 + 0.5);
                let name = match (day_period.split, key) {
                    (Some(split), Some(_)) => split_name(split, key),
                    _ => "Average rentals".to_string(),
                };
                let bars: Vec<Bar> = points
                    .iter()
                    .filter_map(|(period, mean)| {
                        let x = period.as_f64()? + offset;
                        Some(Bar::new(x, *mean).width(width).name(format!("{period}")))
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).color(colors.color_for(key)).name(name));
            }
        });
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

fn correlation_heatmap(ui: &mut Ui, matrix: &CorrelationMatrix) {
    let k = matrix.len();
    if k == 0 {
        ui.label("No numeric fields.");
        return;
    }
    if matrix.rows == 0 {
        ui.label("No rows to correlate.");
        return;
    }

    let cell = 46.0_f32;
    let label_width = 90.0_f32;
    let header_height = 20.0_f32;
    let size = egui::vec2(label_width + cell * k as f32, header_height + cell * k as f32);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let origin = response.rect.min;
    let font = FontId::proportional(10.0);
    let text_color = ui.visuals().text_color();

    for (j, field) in matrix.fields.iter().enumerate() {
        let name: String = field.name().chars().take(7).collect();
        painter.text(
            origin + egui::vec2(label_width + cell * (j as f32 + 0.5), header_height * 0.5),
            Align2::CENTER_CENTER,
            name,
            font.clone(),
            text_color,
        );
    }

    for (i, field) in matrix.fields.iter().enumerate() {
        let row_y = header_height + cell * i as f32;
        painter.text(
            origin + egui::vec2(label_width - 6.0, row_y + cell * 0.5),
            Align2::RIGHT_CENTER,
            field.name(),
            font.clone(),
            text_color,
        );
        for j in 0..k {
            let rect = Rect::from_min_size(
                origin + egui::vec2(label_width + cell * j as f32, row_y),
                egui::vec2(cell, cell),
            )
            .shrink(1.0);
            let (fill, text, ink) = match matrix.get(i, j) {
                Some(r) => (color::diverging(r), format!("{r:.2}"), Color32::BLACK),
                None => (Color32::DARK_GRAY, "n/a".to_string(), Color32::WHITE),
            };
            painter.rect_filled(rect, 0.0, fill);
            painter.text(rect.center(), Align2::CENTER_CENTER, text, font.clone(), ink);
        }
    }

    let undefined = matrix.zero_variance_fields();
    if !undefined.is_empty() {
        let names: Vec<&str> = undefined.iter().map(|f| f.name()).collect();
        ui.label(
            RichText::new(format!("Zero variance (correlation undefined): {}", names.join(", ")))
                .small()
                .italics(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::format_thousands;

    #[test]
    fn thousands_separators() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(2_085_476), "2,085,476");
    }
}
