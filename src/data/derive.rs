//! Feature derivation: raw rental rows → enriched records.
//!
//! Every derived field is a pure function of its own row. Nothing here
//! looks at neighbouring rows or keeps state between calls.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};

use super::loader::LoadedSource;
use super::model::{DayPeriod, EnrichedDataset, EnrichedRecord, RawRecord, Season, Weather};
use crate::error::AggregateWarning;

/// Bin an hour of day into its period.
///
/// Bins are right-open: [0,6) night, [6,12) morning, [12,18) afternoon.
/// The last bin [18,24) also absorbs anything at or above 18, so the
/// mapping is total even for out-of-domain input.
pub fn day_period(hour: u32) -> DayPeriod {
    match hour {
        0..=5 => DayPeriod::Night,
        6..=11 => DayPeriod::Morning,
        12..=17 => DayPeriod::Afternoon,
        _ => DayPeriod::Evening,
    }
}

/// Derive the calendar and categorical fields of a single row.
pub fn derive_record(raw: RawRecord) -> EnrichedRecord {
    let ts = raw.timestamp;
    let hour = ts.hour();
    EnrichedRecord {
        year: ts.year(),
        month: ts.month(),
        day_of_week: ts.weekday(),
        hour,
        day_period: day_period(hour),
        season_label: Season::from_code(raw.season),
        weather_label: Weather::from_code(raw.weather),
        raw,
    }
}

/// Derive every row. Same cardinality and order as the input.
pub fn derive(raw: impl IntoIterator<Item = RawRecord>) -> Vec<EnrichedRecord> {
    raw.into_iter().map(derive_record).collect()
}

/// One warning per distinct season/weather code that has no label.
pub fn undefined_categories(records: &[EnrichedRecord]) -> Vec<AggregateWarning> {
    let mut seasons: BTreeMap<i64, usize> = BTreeMap::new();
    let mut weathers: BTreeMap<i64, usize> = BTreeMap::new();
    for rec in records {
        if rec.season_label == Season::Unknown {
            *seasons.entry(rec.raw.season).or_default() += 1;
        }
        if rec.weather_label == Weather::Unknown {
            *weathers.entry(rec.raw.weather).or_default() += 1;
        }
    }

    let season_warnings = seasons
        .into_iter()
        .map(|(code, rows)| AggregateWarning::UndefinedCategory {
            kind: "season",
            code,
            rows,
        });
    let weather_warnings = weathers
        .into_iter()
        .map(|(code, rows)| AggregateWarning::UndefinedCategory {
            kind: "weather",
            code,
            rows,
        });
    season_warnings.chain(weather_warnings).collect()
}

/// Turn a loaded source into the immutable enriched snapshot.
pub fn enrich(source: LoadedSource) -> EnrichedDataset {
    let records = derive(source.records);
    for warning in undefined_categories(&records) {
        log::warn!("{warning}");
    }
    EnrichedDataset::from_records(records, source.numeric_columns)
}
