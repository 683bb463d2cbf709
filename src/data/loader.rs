use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type, TimeUnit, TimestampMicrosecondType};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::RawRecord;
use crate::error::DataError;

pub const DATETIME: &str = "datetime";
pub const SEASON: &str = "season";
pub const WEATHER: &str = "weather";
pub const WORKINGDAY: &str = "workingday";
pub const COUNT: &str = "count";

const REQUIRED: [&str; 5] = [DATETIME, SEASON, WEATHER, WORKINGDAY, COUNT];

/// Raw rows plus the numeric column order of the source.
#[derive(Debug, Clone, Default)]
pub struct LoadedSource {
    pub records: Vec<RawRecord>,
    /// Numeric columns (required codes/flags/count and covariates) in the
    /// order the source lists them.
    pub numeric_columns: Vec<String>,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load rental rows from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one hour per line (the Kaggle `train.csv` layout)
/// * `.json`    – `[{ "datetime": ..., "season": 1, ... }, ...]`
/// * `.parquet` – same columns; `datetime` as string or timestamp
pub fn load_file(path: &Path) -> Result<LoadedSource, DataError> {
    std::fs::metadata(path).map_err(|e| DataError::from_io(path, e))?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let file = File::open(path).map_err(|e| DataError::from_io(path, e))?;
    match ext.as_str() {
        "csv" => read_csv(file),
        "json" => read_json(file),
        "parquet" | "pq" => read_parquet(file),
        other => Err(DataError::UnsupportedFormat(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Cell parsing shared by all formats
// ---------------------------------------------------------------------------

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Integer code; integral floats such as `"2.0"` are accepted.
fn parse_code(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>().ok().or_else(|| {
        let f = s.parse::<f64>().ok()?;
        (f.fract() == 0.0 && f.is_finite()).then_some(f as i64)
    })
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        other => match parse_code(other)? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        },
    }
}

fn parse_count(s: &str) -> Option<u64> {
    parse_code(s).and_then(|c| u64::try_from(c).ok())
}

/// Numeric covariate cell; empty means missing (NaN).
fn parse_covariate(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Some(f64::NAN);
    }
    s.parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, the required columns anywhere.
/// Any other column whose cells all parse as numbers is a covariate.
pub fn read_csv<R: Read>(input: R) -> Result<LoadedSource, DataError> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let index_of = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    };
    let ts_idx = index_of(DATETIME)?;
    let season_idx = index_of(SEASON)?;
    let weather_idx = index_of(WEATHER)?;
    let wd_idx = index_of(WORKINGDAY)?;
    let count_idx = index_of(COUNT)?;

    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;

    let covariate_cols: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !REQUIRED.contains(&h.as_str()))
        .filter(|(i, h)| {
            let numeric = rows
                .iter()
                .all(|r| parse_covariate(r.get(*i).unwrap_or("")).is_some());
            if !numeric {
                log::debug!("Dropping non-numeric column '{h}'");
            }
            numeric
        })
        .map(|(i, _)| i)
        .collect();

    let numeric_columns = headers
        .iter()
        .enumerate()
        .filter(|(i, h)| *h != DATETIME && (REQUIRED.contains(&h.as_str()) || covariate_cols.contains(i)))
        .map(|(_, h)| h.clone())
        .collect();

    let mut records = Vec::with_capacity(rows.len());
    for (row, record) in rows.iter().enumerate() {
        let cell = |idx: usize| record.get(idx).unwrap_or("");
        let field = |idx: usize, name: &str| DataError::invalid(row, name, cell(idx));

        let timestamp = parse_timestamp(cell(ts_idx)).ok_or_else(|| field(ts_idx, DATETIME))?;
        let season = parse_code(cell(season_idx)).ok_or_else(|| field(season_idx, SEASON))?;
        let weather = parse_code(cell(weather_idx)).ok_or_else(|| field(weather_idx, WEATHER))?;
        let working_day = parse_flag(cell(wd_idx)).ok_or_else(|| field(wd_idx, WORKINGDAY))?;
        let count = parse_count(cell(count_idx)).ok_or_else(|| field(count_idx, COUNT))?;

        let covariates = covariate_cols
            .iter()
            .filter_map(|&i| Some((headers[i].clone(), parse_covariate(cell(i))?)))
            .collect();

        records.push(RawRecord {
            timestamp,
            season,
            weather,
            working_day,
            count,
            covariates,
        });
    }

    Ok(LoadedSource {
        records,
        numeric_columns,
    })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// One element of a records-oriented JSON export.
///
/// ```json
/// [
///   { "datetime": "2011-01-01 00:00:00", "season": 1, "weather": 1,
///     "workingday": 0, "count": 16, "temp": 9.84 },
///   ...
/// ]
/// ```
/// `datetime` may also be epoch milliseconds (the pandas default).
#[derive(Debug, Deserialize)]
struct JsonRow {
    datetime: JsonValue,
    season: JsonValue,
    weather: JsonValue,
    workingday: JsonValue,
    count: JsonValue,
    #[serde(flatten)]
    extra: BTreeMap<String, JsonValue>,
}

fn json_text(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_timestamp(val: &JsonValue) -> Option<NaiveDateTime> {
    match val {
        JsonValue::String(s) => parse_timestamp(s),
        JsonValue::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?).map(|d| d.naive_utc()),
        _ => None,
    }
}

fn json_covariate(val: Option<&JsonValue>) -> Option<f64> {
    match val {
        None | Some(JsonValue::Null) => Some(f64::NAN),
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::Bool(b)) => Some(f64::from(u8::from(*b))),
        Some(_) => None,
    }
}

/// Read a JSON array of row objects.
///
/// JSON objects carry no column order, so numeric columns are listed as
/// `season`, `workingday`, `weather`, the covariates by name, then `count`.
pub fn read_json<R: Read>(input: R) -> Result<LoadedSource, DataError> {
    let rows: Vec<JsonRow> = serde_json::from_reader(input)?;

    let mut candidates: Vec<&String> = rows.iter().flat_map(|r| r.extra.keys()).collect();
    candidates.sort();
    candidates.dedup();
    let covariate_names: Vec<String> = candidates
        .into_iter()
        .filter(|name| {
            let numeric = rows.iter().all(|r| json_covariate(r.extra.get(*name)).is_some());
            if !numeric {
                log::debug!("Dropping non-numeric column '{name}'");
            }
            numeric
        })
        .cloned()
        .collect();

    let mut records = Vec::with_capacity(rows.len());
    for (row, r) in rows.iter().enumerate() {
        let invalid = |name: &str, v: &JsonValue| DataError::invalid(row, name, json_text(v));

        let timestamp = json_timestamp(&r.datetime).ok_or_else(|| invalid(DATETIME, &r.datetime))?;
        let season = parse_code(&json_text(&r.season)).ok_or_else(|| invalid(SEASON, &r.season))?;
        let weather =
            parse_code(&json_text(&r.weather)).ok_or_else(|| invalid(WEATHER, &r.weather))?;
        let working_day = parse_flag(&json_text(&r.workingday))
            .ok_or_else(|| invalid(WORKINGDAY, &r.workingday))?;
        let count = parse_count(&json_text(&r.count)).ok_or_else(|| invalid(COUNT, &r.count))?;

        let covariates = covariate_names
            .iter()
            .filter_map(|name| Some((name.clone(), json_covariate(r.extra.get(name))?)))
            .collect();

        records.push(RawRecord {
            timestamp,
            season,
            weather,
            working_day,
            count,
            covariates,
        });
    }

    let mut numeric_columns: Vec<String> = [SEASON, WORKINGDAY, WEATHER]
        .iter()
        .map(|s| s.to_string())
        .collect();
    numeric_columns.extend(covariate_names);
    numeric_columns.push(COUNT.to_string());

    Ok(LoadedSource {
        records,
        numeric_columns,
    })
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with the rental schema.
///
/// - `datetime`: Utf8 / LargeUtf8, Date32/64 or any Timestamp unit
/// - `season`, `weather`, `count`: any integer or float type
/// - `workingday`: Boolean or any numeric type
/// - every other numeric or boolean column is a covariate
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
pub fn read_parquet(file: File) -> Result<LoadedSource, DataError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let schema = builder.schema().clone();
    for name in REQUIRED {
        schema
            .index_of(name)
            .map_err(|_| DataError::MissingColumn(name.to_string()))?;
    }

    let covariate_names: Vec<String> = schema
        .fields()
        .iter()
        .filter(|f| !REQUIRED.contains(&f.name().as_str()))
        .filter(|f| f.data_type().is_numeric() || *f.data_type() == DataType::Boolean)
        .map(|f| f.name().clone())
        .collect();

    let numeric_columns = schema
        .fields()
        .iter()
        .map(|f| f.name())
        .filter(|name| {
            (name.as_str() != DATETIME && REQUIRED.contains(&name.as_str()))
                || covariate_names.contains(*name)
        })
        .cloned()
        .collect();

    let reader = builder.build()?;
    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let column = |name: &str| batch_column(&batch, name);

        let timestamps = timestamp_column(column(DATETIME)?)?;
        let seasons = cast(column(SEASON)?, &DataType::Int64)?;
        let weathers = cast(column(WEATHER)?, &DataType::Int64)?;
        let flags = cast(column(WORKINGDAY)?, &DataType::Int64)?;
        let counts = cast(column(COUNT)?, &DataType::Int64)?;

        let seasons = seasons.as_primitive::<Int64Type>();
        let weathers = weathers.as_primitive::<Int64Type>();
        let flags = flags.as_primitive::<Int64Type>();
        let counts = counts.as_primitive::<Int64Type>();

        let covariate_cols = covariate_names
            .iter()
            .map(|name| -> Result<_, DataError> {
                Ok((name, cast(column(name.as_str())?, &DataType::Float64)?))
            })
            .collect::<Result<Vec<_>, DataError>>()?;

        let base = records.len();
        for row in 0..batch.num_rows() {
            let at = base + row;
            let timestamp = timestamps[row].ok_or_else(|| DataError::invalid(at, DATETIME, "null"))?;
            if seasons.is_null(row) || weathers.is_null(row) || flags.is_null(row) {
                return Err(DataError::invalid(at, "season/weather/workingday", "null"));
            }
            let working_day = match flags.value(row) {
                0 => false,
                1 => true,
                other => return Err(DataError::invalid(at, WORKINGDAY, other.to_string())),
            };
            if counts.is_null(row) {
                return Err(DataError::invalid(at, COUNT, "null"));
            }
            let count = u64::try_from(counts.value(row))
                .map_err(|_| DataError::invalid(at, COUNT, counts.value(row).to_string()))?;

            let covariates = covariate_cols
                .iter()
                .map(|(name, col)| {
                    let values = col.as_primitive::<Float64Type>();
                    let v = if values.is_null(row) { f64::NAN } else { values.value(row) };
                    ((*name).clone(), v)
                })
                .collect();

            records.push(RawRecord {
                timestamp,
                season: seasons.value(row),
                weather: weathers.value(row),
                working_day,
                count,
                covariates,
            });
        }
    }

    Ok(LoadedSource {
        records,
        numeric_columns,
    })
}

// -- Parquet / Arrow helpers --

fn batch_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef, DataError> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| DataError::MissingColumn(name.to_string()))?;
    Ok(batch.column(idx))
}

/// Decode the timestamp column of one batch into naive date-times.
fn timestamp_column(col: &ArrayRef) -> Result<Vec<Option<NaiveDateTime>>, DataError> {
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            let text = cast(col, &DataType::Utf8)?;
            Ok(text
                .as_string::<i32>()
                .iter()
                .map(|s| s.and_then(parse_timestamp))
                .collect())
        }
        _ => {
            let micros = cast(col, &DataType::Timestamp(TimeUnit::Microsecond, None))?;
            let micros = micros.as_primitive::<TimestampMicrosecondType>();
            Ok((0..micros.len())
                .map(|i| {
                    if micros.is_null(i) {
                        None
                    } else {
                        micros.value_as_datetime(i)
                    }
                })
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_formats() {
        let full = parse_timestamp("2011-01-01 05:00:00").unwrap();
        assert_eq!(full.to_string(), "2011-01-01 05:00:00");
        assert_eq!(parse_timestamp("2011-01-01T05:00:00"), Some(full));
        assert_eq!(parse_timestamp("2011-01-01 05:00"), Some(full));
        assert!(parse_timestamp("2011-01-01").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn flags_and_codes() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("False"), Some(false));
        assert_eq!(parse_flag("2"), None);
        assert_eq!(parse_code("3.0"), Some(3));
        assert_eq!(parse_code("3.5"), None);
        assert_eq!(parse_count("-1"), None);
    }

    #[test]
    fn csv_keeps_numeric_columns_in_order() {
        let text = "\
datetime,season,holiday,workingday,weather,temp,note,count
2011-01-01 00:00:00,1,0,0,1,9.84,a,16
2011-01-01 01:00:00,1,0,0,1,,b,40
";
        let src = read_csv(text.as_bytes()).unwrap();
        assert_eq!(
            src.numeric_columns,
            vec!["season", "holiday", "workingday", "weather", "temp", "count"]
        );
        assert_eq!(src.records.len(), 2);
        assert_eq!(src.records[1].count, 40);
        assert!(src.records[1].covariates["temp"].is_nan());
        assert!(!src.records[0].covariates.contains_key("note"));
    }

    #[test]
    fn csv_missing_required_column() {
        let text = "datetime,season,weather,count\n2011-01-01 00:00:00,1,1,3\n";
        let err = read_csv(text.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn(c) if c == WORKINGDAY));
    }

    #[test]
    fn csv_bad_timestamp_is_reported_with_row() {
        let text = "datetime,season,weather,workingday,count\nsoon,1,1,0,3\n";
        let err = read_csv(text.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::InvalidValue { row: 0, .. }));
    }

    #[test]
    fn json_accepts_epoch_millis() {
        let text = r#"[
            {"datetime": 1293840000000, "season": 1, "weather": 1, "workingday": 0, "count": 16, "temp": 9.84},
            {"datetime": "2011-01-01 01:00:00", "season": 1, "weather": 2, "workingday": true, "count": 40, "temp": null}
        ]"#;
        let src = read_json(text.as_bytes()).unwrap();
        assert_eq!(src.records[0].timestamp, parse_timestamp("2011-01-01 00:00:00").unwrap());
        assert!(src.records[1].working_day);
        assert_eq!(
            src.numeric_columns,
            vec!["season", "workingday", "weather", "temp", "count"]
        );
    }
}
