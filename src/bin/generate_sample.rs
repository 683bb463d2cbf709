use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use clap::Parser;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Write a synthetic hourly bike-sharing dataset as train.csv and train.parquet.
#[derive(Debug, Parser)]
struct Args {
    /// Output directory.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// RNG seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// One output row, in the Kaggle `train.csv` column order.
#[derive(Debug, Serialize)]
struct Row {
    #[serde(with = "csv_datetime")]
    datetime: NaiveDateTime,
    season: i64,
    holiday: i64,
    workingday: i64,
    weather: i64,
    temp: f64,
    atemp: f64,
    humidity: f64,
    windspeed: f64,
    casual: i64,
    registered: i64,
    count: i64,
}

mod csv_datetime {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

const HOLIDAYS: [(i32, u32, u32); 8] = [
    (2011, 1, 17),
    (2011, 2, 21),
    (2011, 4, 15),
    (2011, 9, 5),
    (2012, 1, 16),
    (2012, 2, 20),
    (2012, 7, 4),
    (2012, 9, 3),
];

/// Relative demand by hour: commute peaks on working days, a midday hump otherwise.
fn hour_profile(hour: u32, working: bool) -> f64 {
    let h = hour as f64;
    let bump = |center: f64, width: f64| (-(h - center).powi(2) / (2.0 * width * width)).exp();
    if working {
        0.05 + 1.0 * bump(8.0, 1.0) + 1.2 * bump(17.5, 1.3) + 0.3 * bump(12.5, 2.0)
    } else {
        0.05 + 0.9 * bump(14.0, 3.5)
    }
}

fn generate(rng: &mut StdRng) -> Vec<Row> {
    let mut rows = Vec::new();
    for year in [2011, 2012] {
        for month in 1..=12u32 {
            let season = ((month - 1) / 3 + 1) as i64;
            let month_temp = 10.0 + 15.0 * (((month as f64) - 4.0) / 12.0 * std::f64::consts::TAU).sin().max(-0.6);
            for day in 1..=19u32 {
                let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                    continue;
                };
                let holiday = HOLIDAYS.contains(&(year, month, day));
                let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
                let working = !holiday && !weekend;
                let growth = if year == 2012 { 1.6 } else { 1.0 };

                for hour in 0..24u32 {
                    let Some(datetime) = date.and_hms_opt(hour, 0, 0) else {
                        continue;
                    };
                    let weather: i64 = match rng.gen_range(0..100) {
                        0..=64 => 1,
                        65..=89 => 2,
                        90..=98 => 3,
                        _ => 4,
                    };
                    let temp = (month_temp + rng.gen_range(-4.0..4.0)).max(0.8);
                    let humidity = rng.gen_range(20.0..100.0_f64).round();
                    let windspeed = rng.gen_range(0.0..35.0_f64);
                    let weather_factor = [1.0, 0.8, 0.4, 0.1][(weather - 1) as usize];
                    let temp_factor = 0.4 + temp / 35.0;

                    let demand = 450.0 * hour_profile(hour, working) * growth * weather_factor * temp_factor;
                    let count = (demand * rng.gen_range(0.8..1.2)).round().max(1.0) as i64;
                    let casual_share = if working { 0.12 } else { 0.35 };
                    let casual = (count as f64 * casual_share).round() as i64;

                    rows.push(Row {
                        datetime,
                        season,
                        holiday: i64::from(holiday),
                        workingday: i64::from(working),
                        weather,
                        temp: (temp * 100.0).round() / 100.0,
                        atemp: ((temp + 2.5) * 100.0).round() / 100.0,
                        humidity,
                        windspeed: (windspeed * 1000.0).round() / 1000.0,
                        casual,
                        registered: count - casual,
                        count,
                    });
                }
            }
        }
    }
    rows
}

fn write_csv(rows: &[Row], path: &PathBuf) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(rows: &[Row], path: &PathBuf) -> Result<()> {
    let ints = |f: fn(&Row) -> i64| -> ArrayRef { Arc::new(Int64Array::from(rows.iter().map(f).collect::<Vec<_>>())) };
    let floats = |f: fn(&Row) -> f64| -> ArrayRef { Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>())) };

    let datetimes: ArrayRef = Arc::new(TimestampMicrosecondArray::from(
        rows.iter()
            .map(|r| r.datetime.and_utc().timestamp_micros())
            .collect::<Vec<_>>(),
    ));

    let schema = Arc::new(Schema::new(vec![
        Field::new("datetime", DataType::Timestamp(TimeUnit::Microsecond, None), false),
        Field::new("season", DataType::Int64, false),
        Field::new("holiday", DataType::Int64, false),
        Field::new("workingday", DataType::Int64, false),
        Field::new("weather", DataType::Int64, false),
        Field::new("temp", DataType::Float64, false),
        Field::new("atemp", DataType::Float64, false),
        Field::new("humidity", DataType::Float64, false),
        Field::new("windspeed", DataType::Float64, false),
        Field::new("casual", DataType::Int64, false),
        Field::new("registered", DataType::Int64, false),
        Field::new("count", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            datetimes,
            ints(|r| r.season),
            ints(|r| r.holiday),
            ints(|r| r.workingday),
            ints(|r| r.weather),
            floats(|r| r.temp),
            floats(|r| r.atemp),
            floats(|r| r.humidity),
            floats(|r| r.windspeed),
            ints(|r| r.casual),
            ints(|r| r.registered),
            ints(|r| r.count),
        ],
    )
    .context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut rng = StdRng::seed_from_u64(args.seed);
    let rows = generate(&mut rng);

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    let csv_path = args.out_dir.join("train.csv");
    let parquet_path = args.out_dir.join("train.parquet");
    write_csv(&rows, &csv_path)?;
    write_parquet(&rows, &parquet_path)?;

    log::info!(
        "Wrote {} hourly rows to {} and {}",
        rows.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
