use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{NaiveDateTime, Weekday};

// ---------------------------------------------------------------------------
// Categorical labels
// ---------------------------------------------------------------------------

/// Season label mapped from the source `season` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
    /// Any code outside 1–4.
    Unknown,
}

impl Season {
    pub const KNOWN: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Season::Spring,
            2 => Season::Summer,
            3 => Season::Fall,
            4 => Season::Winter,
            _ => Season::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
            Season::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Weather label mapped from the source `weather` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weather {
    ClearCloudy,
    MistCloudy,
    LightRainSnow,
    HeavyRainSnow,
    Unknown,
}

impl Weather {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Weather::ClearCloudy,
            2 => Weather::MistCloudy,
            3 => Weather::LightRainSnow,
            4 => Weather::HeavyRainSnow,
            _ => Weather::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Weather::ClearCloudy => "Clear/Cloudy",
            Weather::MistCloudy => "Mist/Cloudy",
            Weather::LightRainSnow => "Light Rain/Snow",
            Weather::HeavyRainSnow => "Heavy Rain/Snow",
            Weather::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coarse time-of-day bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DayPeriod {
    /// [0, 6)
    Night,
    /// [6, 12)
    Morning,
    /// [12, 18)
    Afternoon,
    /// [18, 24)
    Evening,
}

impl DayPeriod {
    pub const ALL: [DayPeriod; 4] = [
        DayPeriod::Night,
        DayPeriod::Morning,
        DayPeriod::Afternoon,
        DayPeriod::Evening,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DayPeriod::Night => "night",
            DayPeriod::Morning => "morning",
            DayPeriod::Afternoon => "afternoon",
            DayPeriod::Evening => "evening",
        }
    }

    /// Position on a categorical axis.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One observed hour of rental activity, as read from the source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub timestamp: NaiveDateTime,
    /// Season code, nominally 1–4.
    pub season: i64,
    /// Weather code, nominally 1–4.
    pub weather: i64,
    pub working_day: bool,
    pub count: u64,
    /// Remaining numeric source columns (temperature, humidity, ...).
    pub covariates: BTreeMap<String, f64>,
}

/// A raw record plus its calendar and categorical fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub raw: RawRecord,
    pub year: i32,
    pub month: u32,
    pub day_of_week: Weekday,
    pub hour: u32,
    pub day_period: DayPeriod,
    pub season_label: Season,
    pub weather_label: Weather,
}

// ---------------------------------------------------------------------------
// FieldValue – a group key component
// ---------------------------------------------------------------------------

/// A categorical value a record can be grouped by.
/// Used as a `BTreeMap` key downstream, so it must be `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Int(i64),
    Flag(bool),
    Weekday(Weekday),
    Period(DayPeriod),
    Season(Season),
    Weather(Weather),
}

// -- Manual Ord: chrono::Weekday has no ordering of its own --

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use FieldValue as V;
        fn discriminant(v: &FieldValue) -> u8 {
            match v {
                V::Int(_) => 0,
                V::Flag(_) => 1,
                V::Weekday(_) => 2,
                V::Period(_) => 3,
                V::Season(_) => 4,
                V::Weather(_) => 5,
            }
        }
        match (self, other) {
            (V::Int(a), V::Int(b)) => a.cmp(b),
            (V::Flag(a), V::Flag(b)) => a.cmp(b),
            (V::Weekday(a), V::Weekday(b)) => a
                .num_days_from_monday()
                .cmp(&b.num_days_from_monday()),
            (V::Period(a), V::Period(b)) => a.cmp(b),
            (V::Season(a), V::Season(b)) => a.cmp(b),
            (V::Weather(a), V::Weather(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Flag(b) => write!(f, "{}", u8::from(*b)),
            FieldValue::Weekday(d) => f.write_str(weekday_name(*d)),
            FieldValue::Period(p) => write!(f, "{p}"),
            FieldValue::Season(s) => write!(f, "{s}"),
            FieldValue::Weather(w) => write!(f, "{w}"),
        }
    }
}

impl FieldValue {
    /// Position on a numeric plot axis, where one exists.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Flag(b) => Some(f64::from(u8::from(*b))),
            FieldValue::Weekday(d) => Some(d.num_days_from_monday() as f64),
            FieldValue::Period(p) => Some(p.index() as f64),
            _ => None,
        }
    }
}

/// Full English day name, e.g. "Monday".
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

// ---------------------------------------------------------------------------
// Field selectors
// ---------------------------------------------------------------------------

/// Categorical fields usable as a `group_mean` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupField {
    Year,
    Month,
    Hour,
    DayOfWeek,
    DayPeriod,
    Season,
    Weather,
    WorkingDay,
}

impl GroupField {
    pub fn name(self) -> &'static str {
        match self {
            GroupField::Year => "year",
            GroupField::Month => "month",
            GroupField::Hour => "hour",
            GroupField::DayOfWeek => "day_of_week",
            GroupField::DayPeriod => "day_period",
            GroupField::Season => "season_label",
            GroupField::Weather => "weather_label",
            GroupField::WorkingDay => "workingday",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let field = match name {
            "year" => GroupField::Year,
            "month" => GroupField::Month,
            "hour" => GroupField::Hour,
            "day_of_week" => GroupField::DayOfWeek,
            "day_period" => GroupField::DayPeriod,
            "season_label" => GroupField::Season,
            "weather_label" => GroupField::Weather,
            "workingday" => GroupField::WorkingDay,
            _ => return None,
        };
        Some(field)
    }

    pub fn value(self, rec: &EnrichedRecord) -> FieldValue {
        match self {
            GroupField::Year => FieldValue::Int(rec.year as i64),
            GroupField::Month => FieldValue::Int(rec.month as i64),
            GroupField::Hour => FieldValue::Int(rec.hour as i64),
            GroupField::DayOfWeek => FieldValue::Weekday(rec.day_of_week),
            GroupField::DayPeriod => FieldValue::Period(rec.day_period),
            GroupField::Season => FieldValue::Season(rec.season_label),
            GroupField::Weather => FieldValue::Weather(rec.weather_label),
            GroupField::WorkingDay => FieldValue::Flag(rec.raw.working_day),
        }
    }
}

impl fmt::Display for GroupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric fields usable in the correlation matrix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumericField {
    Season,
    Weather,
    WorkingDay,
    Count,
    Year,
    Month,
    Hour,
    /// A numeric source column carried opaquely.
    Covariate(String),
}

impl NumericField {
    /// Resolve a column name. Categorical columns yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        let field = match name {
            "season" => NumericField::Season,
            "weather" => NumericField::Weather,
            "workingday" => NumericField::WorkingDay,
            "count" => NumericField::Count,
            "year" => NumericField::Year,
            "month" => NumericField::Month,
            "hour" => NumericField::Hour,
            "datetime" | "day_of_week" | "day_period" | "season_label" | "weather_label" => {
                return None
            }
            other => NumericField::Covariate(other.to_string()),
        };
        Some(field)
    }

    pub fn name(&self) -> &str {
        match self {
            NumericField::Season => "season",
            NumericField::Weather => "weather",
            NumericField::WorkingDay => "workingday",
            NumericField::Count => "count",
            NumericField::Year => "year",
            NumericField::Month => "month",
            NumericField::Hour => "hour",
            NumericField::Covariate(name) => name,
        }
    }

    /// The field's value for `rec`; `None` when a covariate is absent.
    pub fn value(&self, rec: &EnrichedRecord) -> Option<f64> {
        let v = match self {
            NumericField::Season => rec.raw.season as f64,
            NumericField::Weather => rec.raw.weather as f64,
            NumericField::WorkingDay => f64::from(u8::from(rec.raw.working_day)),
            NumericField::Count => rec.raw.count as f64,
            NumericField::Year => rec.year as f64,
            NumericField::Month => rec.month as f64,
            NumericField::Hour => rec.hour as f64,
            NumericField::Covariate(name) => return rec.raw.covariates.get(name).copied(),
        };
        Some(v)
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// EnrichedDataset – the immutable, loaded snapshot
// ---------------------------------------------------------------------------

/// The full enriched record set with pre-computed filter options.
#[derive(Debug, Clone, Default)]
pub struct EnrichedDataset {
    /// All records, in source order.
    pub records: Vec<EnrichedRecord>,
    /// Numeric source columns in source order (including the required
    /// `season`, `weather`, `workingday`, `count`).
    pub source_columns: Vec<String>,
    /// Distinct years, sorted.
    pub years: BTreeSet<i32>,
    /// Distinct season labels, sorted (Unknown last).
    pub seasons: BTreeSet<Season>,
}

impl EnrichedDataset {
    /// Build filter indices from the enriched records.
    pub fn from_records(records: Vec<EnrichedRecord>, source_columns: Vec<String>) -> Self {
        let years = records.iter().map(|r| r.year).collect();
        let seasons = records.iter().map(|r| r.season_label).collect();
        EnrichedDataset {
            records,
            source_columns,
            years,
            seasons,
        }
    }

    /// Numeric fields in correlation order: source columns, then the
    /// derived calendar fields.
    pub fn numeric_fields(&self) -> Vec<NumericField> {
        let mut fields: Vec<NumericField> = self
            .source_columns
            .iter()
            .filter_map(|c| NumericField::from_name(c))
            .collect();
        for derived in [NumericField::Year, NumericField::Month, NumericField::Hour] {
            if !fields.contains(&derived) {
                fields.push(derived);
            }
        }
        fields
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
