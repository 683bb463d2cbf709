use std::collections::BTreeMap;
use std::sync::Arc;

use crate::data::aggregate::{
    correlation, distribution, group_mean, summarize, BoxStats, CorrelationMatrix, GroupMeans,
    Summary,
};
use crate::data::filter::{apply_filter, DayType, FilterSpec};
use crate::data::model::{EnrichedDataset, EnrichedRecord, FieldValue, GroupField, Season};

/// Choices for the day-period bar split.
pub const COLOR_BY_OPTIONS: [Option<GroupField>; 3] =
    [Some(GroupField::Season), Some(GroupField::WorkingDay), None];

// ---------------------------------------------------------------------------
// DashboardView – everything the charts read, recomputed per interaction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DashboardView {
    /// Positions of the filtered records in the snapshot.
    pub visible_indices: Vec<usize>,
    /// Positions of the first `preview_rows` filtered records.
    pub preview_indices: Vec<usize>,
    pub summary: Summary,
    /// Mean per hour, split by working day.
    pub hourly: GroupMeans,
    pub monthly: GroupMeans,
    pub weather: BTreeMap<FieldValue, BoxStats>,
    /// Mean per day period, split by the color-by field.
    pub day_period: GroupMeans,
    /// Only computed while the heatmap is shown.
    pub correlation: Option<CorrelationMatrix>,
}

/// Widget settings that shape the view besides the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSettings {
    pub color_by: Option<GroupField>,
    pub show_heatmap: bool,
    pub preview_rows: usize,
}

impl DashboardView {
    pub fn compute(dataset: &EnrichedDataset, filters: &FilterSpec, settings: ViewSettings) -> Self {
        let view = apply_filter(&dataset.records, filters);
        DashboardView {
            visible_indices: view.indices().to_vec(),
            preview_indices: view.head(settings.preview_rows).indices().to_vec(),
            summary: summarize(&view),
            hourly: group_mean(&view, GroupField::Hour, Some(GroupField::WorkingDay)),
            monthly: group_mean(&view, GroupField::Month, None),
            weather: distribution(&view, GroupField::Weather),
            day_period: group_mean(&view, GroupField::DayPeriod, settings.color_by),
            correlation: settings
                .show_heatmap
                .then(|| correlation(&view, &dataset.numeric_fields())),
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// One session's state, independent of rendering.
///
/// The dataset snapshot is shared and read-only; filters and the computed
/// view belong to this session alone.
pub struct AppState {
    /// Shared, immutable enriched snapshot.
    pub dataset: Arc<EnrichedDataset>,

    /// Current sidebar selections.
    pub filters: FilterSpec,

    /// Split for the day-period chart.
    pub color_by: Option<GroupField>,

    /// Whether the correlation heatmap is drawn.
    pub show_heatmap: bool,

    /// Rows in the raw-data preview.
    pub preview_rows: usize,

    /// Aggregates for the current filters (cached).
    pub view: DashboardView,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(dataset: Arc<EnrichedDataset>, preview_rows: usize) -> Self {
        let filters = FilterSpec::select_all(&dataset);
        let settings = ViewSettings {
            color_by: COLOR_BY_OPTIONS[0],
            show_heatmap: true,
            preview_rows,
        };
        let view = DashboardView::compute(&dataset, &filters, settings);
        AppState {
            dataset,
            filters,
            color_by: settings.color_by,
            show_heatmap: settings.show_heatmap,
            preview_rows,
            view,
            status_message: None,
        }
    }

    /// Ingest a new snapshot and reset filters to show everything.
    pub fn set_dataset(&mut self, dataset: Arc<EnrichedDataset>) {
        self.filters = FilterSpec::select_all(&dataset);
        self.dataset = dataset;
        self.status_message = None;
        self.recompute();
    }

    /// Recompute the view after any filter or widget change.
    pub fn recompute(&mut self) {
        let settings = ViewSettings {
            color_by: self.color_by,
            show_heatmap: self.show_heatmap,
            preview_rows: self.preview_rows,
        };
        self.view = DashboardView::compute(&self.dataset, &self.filters, settings);
    }

    /// The first `preview_rows` filtered records.
    pub fn preview(&self) -> impl Iterator<Item = &EnrichedRecord> + '_ {
        self.view
            .preview_indices
            .iter()
            .map(move |&i| &self.dataset.records[i])
    }

    pub fn toggle_year(&mut self, year: i32) {
        if !self.filters.years.remove(&year) {
            self.filters.years.insert(year);
        }
        self.recompute();
    }

    pub fn toggle_season(&mut self, season: Season) {
        if !self.filters.seasons.remove(&season) {
            self.filters.seasons.insert(season);
        }
        self.recompute();
    }

    pub fn select_all_years(&mut self) {
        self.filters.years = self.dataset.years.clone();
        self.recompute();
    }

    pub fn select_no_years(&mut self) {
        self.filters.years.clear();
        self.recompute();
    }

    pub fn select_all_seasons(&mut self) {
        self.filters.seasons = self.dataset.seasons.clone();
        self.recompute();
    }

    pub fn select_no_seasons(&mut self) {
        self.filters.seasons.clear();
        self.recompute();
    }

    pub fn set_day_type(&mut self, day_type: DayType) {
        self.filters.day_type = day_type;
        self.recompute();
    }

    pub fn set_color_by(&mut self, color_by: Option<GroupField>) {
        self.color_by = color_by;
        self.recompute();
    }

    pub fn set_show_heatmap(&mut self, show: bool) {
        self.show_heatmap = show;
        self.recompute();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive::derive;
    use crate::data::model::RawRecord;
    use chrono::NaiveDate;

    fn dataset() -> Arc<EnrichedDataset> {
        let raw = |y, m, d, h, season, wd, count| RawRecord {
            timestamp: NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap(),
            season,
            weather: 1,
            working_day: wd,
            count,
            covariates: Default::default(),
        };
        let records = derive(vec![
            raw(2011, 1, 1, 0, 1, false, 10),
            raw(2011, 6, 15, 14, 2, true, 50),
            raw(2012, 1, 1, 20, 1, false, 5),
        ]);
        let columns = ["season", "weather", "workingday", "count"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Arc::new(EnrichedDataset::from_records(records, columns))
    }

    #[test]
    fn starts_with_everything_selected() {
        let state = AppState::new(dataset(), 100);
        assert_eq!(state.view.visible_indices, vec![0, 1, 2]);
        assert_eq!(state.view.summary.total_rentals, 65);
        assert_eq!(state.color_by, Some(GroupField::Season));
        assert!(state.show_heatmap);
    }

    #[test]
    fn toggling_a_year_recomputes() {
        let mut state = AppState::new(dataset(), 100);
        state.toggle_year(2012);
        assert_eq!(state.view.visible_indices, vec![0, 1]);
        assert_eq!(state.view.summary.total_rentals, 60);
        state.toggle_year(2012);
        assert_eq!(state.view.visible_indices.len(), 3);
    }

    #[test]
    fn clearing_seasons_empties_the_view() {
        let mut state = AppState::new(dataset(), 100);
        state.select_no_seasons();
        assert!(state.view.visible_indices.is_empty());
        assert_eq!(state.view.summary.average_rentals_per_hour, None);
        state.select_all_seasons();
        assert_eq!(state.view.visible_indices.len(), 3);
    }

    #[test]
    fn color_by_none_gives_unsplit_groups() {
        let mut state = AppState::new(dataset(), 100);
        state.set_color_by(None);
        assert!(state.view.day_period.means.keys().all(|k| k.secondary.is_none()));
    }

    #[test]
    fn preview_is_bounded() {
        let mut state = AppState::new(dataset(), 2);
        assert_eq!(state.preview().count(), 2);
        state.set_day_type(DayType::WorkingDay);
        assert_eq!(state.preview().count(), 1);
        assert_eq!(state.view.preview_indices, vec![1]);
    }

    #[test]
    fn correlation_follows_the_heatmap_toggle() {
        let mut state = AppState::new(dataset(), 100);
        assert!(state.view.correlation.is_some());
        state.set_show_heatmap(false);
        assert!(state.view.correlation.is_none());
        state.toggle_year(2012);
        assert!(state.view.correlation.is_none());
        state.set_show_heatmap(true);
        assert_eq!(state.view.correlation.as_ref().map(|m| m.rows), Some(2));
    }

    #[test]
    fn sessions_share_the_snapshot() {
        let ds = dataset();
        let mut a = AppState::new(Arc::clone(&ds), 100);
        let b = AppState::new(Arc::clone(&ds), 100);
        a.select_no_years();
        assert!(a.view.visible_indices.is_empty());
        assert_eq!(b.view.visible_indices.len(), 3);
        assert!(Arc::ptr_eq(&a.dataset, &b.dataset));
    }
}
