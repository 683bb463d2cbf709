use std::collections::BTreeSet;
use std::fmt;

use super::model::{EnrichedDataset, EnrichedRecord, Season};

// ---------------------------------------------------------------------------
// Filter predicate: selected years, seasons and day type
// ---------------------------------------------------------------------------

/// Which days pass the working-day filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DayType {
    #[default]
    All,
    WorkingDay,
    NonWorkingDay,
}

impl DayType {
    pub const ALL: [DayType; 3] = [DayType::All, DayType::WorkingDay, DayType::NonWorkingDay];

    pub fn label(self) -> &'static str {
        match self {
            DayType::All => "All",
            DayType::WorkingDay => "Working Day",
            DayType::NonWorkingDay => "Non-Working Day",
        }
    }

    pub fn accepts(self, working_day: bool) -> bool {
        match self {
            DayType::All => true,
            DayType::WorkingDay => working_day,
            DayType::NonWorkingDay => !working_day,
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// User-chosen filter criteria.
///
/// An empty `years` or `seasons` set selects nothing: there is no implicit
/// "everything" fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub years: BTreeSet<i32>,
    pub seasons: BTreeSet<Season>,
    pub day_type: DayType,
}

impl FilterSpec {
    /// Initialise a [`FilterSpec`] with all values selected (i.e., show everything).
    pub fn select_all(dataset: &EnrichedDataset) -> Self {
        FilterSpec {
            years: dataset.years.clone(),
            seasons: dataset.seasons.clone(),
            day_type: DayType::All,
        }
    }

    pub fn matches(&self, rec: &EnrichedRecord) -> bool {
        self.years.contains(&rec.year)
            && self.seasons.contains(&rec.season_label)
            && self.day_type.accepts(rec.raw.working_day)
    }
}

// ---------------------------------------------------------------------------
// FilteredView
// ---------------------------------------------------------------------------

/// The records passing a [`FilterSpec`], in source order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    records: &'a [EnrichedRecord],
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// A view over every record.
    pub fn all(records: &'a [EnrichedRecord]) -> Self {
        FilteredView {
            records,
            indices: (0..records.len()).collect(),
        }
    }

    /// Positions of the passing records in the full set, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a EnrichedRecord> + '_ {
        let records = self.records;
        self.indices.iter().map(move |&i| &records[i])
    }

    /// The first `n` passing records, as a narrower view.
    pub fn head(&self, n: usize) -> FilteredView<'a> {
        FilteredView {
            records: self.records,
            indices: self.indices.iter().take(n).copied().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Return the records that pass every criterion of `spec`.
///
/// A record passes when its year is selected, its season label is selected
/// and the day type accepts its working-day flag.
pub fn apply_filter<'a>(records: &'a [EnrichedRecord], spec: &FilterSpec) -> FilteredView<'a> {
    let indices = records
        .iter()
        .enumerate()
        .filter(|(_, rec)| spec.matches(rec))
        .map(|(i, _)| i)
        .collect();
    FilteredView { records, indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive::derive;
    use crate::data::model::RawRecord;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn rec(year: i32, month: u32, hour: u32, season: i64, working_day: bool, count: u64) -> RawRecord {
        RawRecord {
            timestamp: NaiveDate::from_ymd_opt(year, month, 1)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            season,
            weather: 1,
            working_day,
            count,
            covariates: BTreeMap::new(),
        }
    }

    fn sample() -> Vec<EnrichedRecord> {
        derive(vec![
            rec(2011, 1, 0, 1, false, 10),
            rec(2011, 6, 14, 2, true, 50),
            rec(2012, 1, 20, 1, false, 5),
            rec(2012, 9, 8, 3, true, 70),
            rec(2012, 12, 8, 7, true, 3),
        ])
    }

    fn spec(years: &[i32], seasons: &[Season], day_type: DayType) -> FilterSpec {
        FilterSpec {
            years: years.iter().copied().collect(),
            seasons: seasons.iter().copied().collect(),
            day_type,
        }
    }

    #[test]
    fn empty_years_selects_nothing() {
        let records = sample();
        let view = apply_filter(&records, &spec(&[], &Season::KNOWN, DayType::All));
        assert!(view.is_empty());
    }

    #[test]
    fn empty_seasons_selects_nothing() {
        let records = sample();
        let view = apply_filter(&records, &spec(&[2011, 2012], &[], DayType::All));
        assert!(view.is_empty());
    }

    #[test]
    fn day_type_filters_on_flag() {
        let records = sample();
        let all_seasons = [Season::Spring, Season::Summer, Season::Fall, Season::Unknown];
        let working = apply_filter(&records, &spec(&[2011, 2012], &all_seasons, DayType::WorkingDay));
        assert_eq!(working.indices(), &[1, 3, 4]);
        let off = apply_filter(&records, &spec(&[2011, 2012], &all_seasons, DayType::NonWorkingDay));
        assert_eq!(off.indices(), &[0, 2]);
    }

    #[test]
    fn unknown_season_is_its_own_bucket() {
        let records = sample();
        let view = apply_filter(&records, &spec(&[2012], &[Season::Unknown], DayType::All));
        assert_eq!(view.indices(), &[4]);
    }

    #[test]
    fn head_is_bounded() {
        let records = sample();
        let view = FilteredView::all(&records);
        assert_eq!(view.head(2).len(), 2);
        assert_eq!(view.head(2).indices(), &view.indices()[..2]);
        assert_eq!(view.head(100).len(), records.len());
    }

    fn season_strategy() -> impl Strategy<Value = Season> {
        prop_oneof![
            Just(Season::Spring),
            Just(Season::Summer),
            Just(Season::Fall),
            Just(Season::Winter),
            Just(Season::Unknown),
        ]
    }

    proptest! {
        #[test]
        fn narrower_spec_yields_subsequence(
            wide_years in proptest::collection::btree_set(2010i32..2014, 0..4),
            wide_seasons in proptest::collection::btree_set(season_strategy(), 0..5),
            drop_year in any::<bool>(),
            drop_season in any::<bool>(),
        ) {
            let records = sample();
            let wide = FilterSpec { years: wide_years.clone(), seasons: wide_seasons.clone(), day_type: DayType::All };
            let mut narrow = wide.clone();
            if drop_year {
                if let Some(y) = wide_years.iter().next() { narrow.years.remove(y); }
            }
            if drop_season {
                if let Some(s) = wide_seasons.iter().next() { narrow.seasons.remove(s); }
            }

            let wide_view = apply_filter(&records, &wide);
            let again = apply_filter(&records, &wide);
            prop_assert_eq!(wide_view.indices(), again.indices());

            let narrow_view = apply_filter(&records, &narrow);
            let mut it = wide_view.indices().iter();
            for i in narrow_view.indices() {
                prop_assert!(it.any(|w| w == i));
            }
        }
    }
}
