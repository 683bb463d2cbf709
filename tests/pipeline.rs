use std::fs;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use bike_panda::data::aggregate::{group_mean, summarize};
use bike_panda::data::cache::DatasetCache;
use bike_panda::data::filter::{apply_filter, DayType, FilterSpec};
use bike_panda::data::model::{DayPeriod, FieldValue, GroupField, NumericField, Season};
use bike_panda::error::DataError;

const THREE_ROWS: &str = "\
datetime,season,holiday,workingday,weather,temp,count
2011-01-01 00:00:00,1,0,0,1,9.84,10
2011-06-15 14:00:00,2,0,1,2,28.7,50
2012-01-01 20:00:00,1,0,0,1,8.2,5
";

fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn write_parquet(path: &Path, schema: Arc<Schema>, columns: Vec<ArrayRef>) {
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
    let file = fs::File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn rental_schema(workingday: DataType) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("datetime", DataType::Utf8, false),
        Field::new("season", DataType::Int64, false),
        Field::new("weather", DataType::Int64, false),
        Field::new("workingday", workingday, false),
        Field::new("count", DataType::Int64, true),
    ]))
}

fn spec(years: &[i32], seasons: &[Season]) -> FilterSpec {
    FilterSpec {
        years: years.iter().copied().collect(),
        seasons: seasons.iter().copied().collect(),
        day_type: DayType::All,
    }
}

#[test]
fn year_filter_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DatasetCache::load(write(dir.path(), "train.csv", THREE_ROWS)).unwrap();
    let ds = cache.snapshot();

    let view = apply_filter(&ds.records, &spec(&[2011], &Season::KNOWN));
    assert_eq!(view.indices(), &[0, 1]);

    let s = summarize(&view);
    assert_eq!(s.total_rentals, 60);
    assert_eq!(s.average_rentals_per_hour, Some(30.0));
    assert_eq!(s.max_rentals_per_hour, Some(50));
}

#[test]
fn season_filter_and_day_period_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DatasetCache::load(write(dir.path(), "train.csv", THREE_ROWS)).unwrap();
    let ds = cache.snapshot();

    let view = apply_filter(&ds.records, &spec(&[2011, 2012], &[Season::Spring]));
    assert_eq!(view.indices(), &[0, 2]);

    let g = group_mean(&view, GroupField::DayPeriod, None);
    assert_eq!(g.means.len(), 2);
    assert_eq!(g.get(FieldValue::Period(DayPeriod::Night)), Some(10.0));
    assert_eq!(g.get(FieldValue::Period(DayPeriod::Evening)), Some(5.0));
}

#[test]
fn empty_years_gives_empty_view_and_sentinels() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DatasetCache::load(write(dir.path(), "train.csv", THREE_ROWS)).unwrap();
    let ds = cache.snapshot();

    let view = apply_filter(&ds.records, &spec(&[], &Season::KNOWN));
    assert!(view.is_empty());
    let s = summarize(&view);
    assert_eq!(s.total_rentals, 0);
    assert_eq!(s.average_rentals_per_hour, None);
    assert_eq!(s.max_rentals_per_hour, None);
}

#[test]
fn numeric_fields_follow_source_then_calendar() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DatasetCache::load(write(dir.path(), "train.csv", THREE_ROWS)).unwrap();
    let names: Vec<String> = cache
        .snapshot()
        .numeric_fields()
        .iter()
        .map(NumericField::to_string)
        .collect();
    assert_eq!(
        names,
        vec!["season", "holiday", "workingday", "weather", "temp", "count", "year", "month", "hour"]
    );
}

#[test]
fn missing_source_is_data_source_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = DatasetCache::load(dir.path().join("train.csv")).unwrap_err();
    assert!(matches!(err, DataError::DataSourceNotFound { .. }));
    assert!(err.to_string().contains("train.csv"));
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = DatasetCache::load(write(dir.path(), "train.xlsx", "x")).unwrap_err();
    assert!(matches!(err, DataError::UnsupportedFormat(ext) if ext == "xlsx"));
}

#[test]
fn refresh_reloads_only_on_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "train.csv", THREE_ROWS);
    let mut cache = DatasetCache::load(path.clone()).unwrap();
    let before = cache.snapshot();

    assert!(!cache.refresh().unwrap());
    assert!(Arc::ptr_eq(&before, &cache.snapshot()));

    let grown = format!("{THREE_ROWS}2012-07-01 08:00:00,3,0,1,1,30.1,120\n");
    fs::write(&path, grown).unwrap();
    assert!(cache.refresh().unwrap());
    assert_eq!(cache.snapshot().len(), 4);
    // sessions holding the old snapshot still see it unchanged
    assert_eq!(before.len(), 3);
}

#[test]
fn failed_reload_keeps_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "train.csv", THREE_ROWS);
    let mut cache = DatasetCache::load(path.clone()).unwrap();

    fs::remove_file(&path).unwrap();
    let err = cache.invalidate().unwrap_err();
    assert!(matches!(err, DataError::DataSourceNotFound { .. }));
    assert_eq!(cache.snapshot().len(), 3);
}

#[test]
fn unknown_codes_load_into_unknown_bucket() {
    let dir = tempfile::tempdir().unwrap();
    let text = "\
datetime,season,weather,workingday,count
2011-03-01 09:00:00,9,1,1,7
2011-03-01 10:00:00,1,6,1,3
";
    let cache = DatasetCache::load(write(dir.path(), "odd.csv", text)).unwrap();
    let ds = cache.snapshot();
    assert!(ds.seasons.contains(&Season::Unknown));

    let view = apply_filter(&ds.records, &spec(&[2011], &[Season::Unknown]));
    assert_eq!(view.indices(), &[0]);
    let by_weather = group_mean(&apply_filter(&ds.records, &FilterSpec::select_all(&ds)), GroupField::Weather, None);
    assert_eq!(by_weather.means.len(), 2);
}

#[test]
fn json_source_loads() {
    let dir = tempfile::tempdir().unwrap();
    let text = r#"[
        {"datetime": "2011-01-01 00:00:00", "season": 1, "weather": 1, "workingday": 0, "count": 10, "temp": 9.84},
        {"datetime": "2011-06-15 14:00:00", "season": 2, "weather": 2, "workingday": 1, "count": 50, "temp": 28.7}
    ]"#;
    let cache = DatasetCache::load(write(dir.path(), "train.json", text)).unwrap();
    let ds = cache.snapshot();
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.records[1].day_period, DayPeriod::Afternoon);
    assert_eq!(ds.records[1].raw.covariates["temp"], 28.7);
}

#[test]
fn parquet_source_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train.parquet");

    let schema = Arc::new(Schema::new(vec![
        Field::new("datetime", DataType::Utf8, false),
        Field::new("season", DataType::Int64, false),
        Field::new("weather", DataType::Int64, false),
        Field::new("workingday", DataType::Int32, false),
        Field::new("temp", DataType::Float64, true),
        Field::new("count", DataType::Int64, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec![
            "2011-01-01 00:00:00",
            "2011-06-15 14:00:00",
            "2012-01-01 20:00:00",
        ])),
        Arc::new(Int64Array::from(vec![1, 2, 1])),
        Arc::new(Int64Array::from(vec![1, 2, 1])),
        Arc::new(Int32Array::from(vec![0, 1, 0])),
        Arc::new(Float64Array::from(vec![Some(9.84), None, Some(8.2)])),
        Arc::new(Int64Array::from(vec![10, 50, 5])),
    ];
    write_parquet(&path, schema, columns);

    let cache = DatasetCache::load(path).unwrap();
    let ds = cache.snapshot();
    assert_eq!(ds.len(), 3);
    assert!(ds.records[1].raw.working_day);
    assert!(ds.records[1].raw.covariates["temp"].is_nan());
    assert_eq!(ds.source_columns, vec!["season", "weather", "workingday", "temp", "count"]);

    let view = apply_filter(&ds.records, &spec(&[2011], &Season::KNOWN));
    assert_eq!(summarize(&view).total_rentals, 60);
}

#[test]
fn parquet_workingday_must_be_zero_or_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train.parquet");
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec!["2011-01-01 00:00:00", "2011-01-01 01:00:00"])),
        Arc::new(Int64Array::from(vec![1, 1])),
        Arc::new(Int64Array::from(vec![1, 1])),
        Arc::new(Int64Array::from(vec![1, 2])),
        Arc::new(Int64Array::from(vec![10, 20])),
    ];
    write_parquet(&path, rental_schema(DataType::Int64), columns);

    let err = DatasetCache::load(path).unwrap_err();
    assert!(matches!(
        err,
        DataError::InvalidValue { row: 1, ref column, ref value } if column == "workingday" && value == "2"
    ));
}

#[test]
fn parquet_null_count_is_reported_as_null() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train.parquet");
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec!["2011-01-01 00:00:00", "2011-01-01 01:00:00"])),
        Arc::new(Int64Array::from(vec![1, 1])),
        Arc::new(Int64Array::from(vec![1, 1])),
        Arc::new(BooleanArray::from(vec![true, false])),
        Arc::new(Int64Array::from(vec![Some(10), None])),
    ];
    write_parquet(&path, rental_schema(DataType::Boolean), columns);

    let err = DatasetCache::load(path).unwrap_err();
    assert!(matches!(
        err,
        DataError::InvalidValue { row: 1, ref column, ref value } if column == "count" && value == "null"
    ));
}
