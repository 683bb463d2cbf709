use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Bike-sharing demand dashboard.
#[derive(Debug, Clone, Parser)]
#[command(name = "bike-panda", version, about)]
pub struct Config {
    /// Rental dataset (.csv, .json or .parquet).
    #[arg(env = "BIKE_PANDA_DATA", default_value = "train.csv")]
    pub data: PathBuf,

    /// Rows shown in the raw-data preview.
    #[arg(long, default_value_t = 100)]
    pub preview_rows: usize,

    /// Seconds between checks of the source file for changes (0 disables).
    #[arg(long, default_value_t = 2)]
    pub reload_interval_secs: u64,
}

impl Config {
    pub fn reload_interval(&self) -> Option<Duration> {
        (self.reload_interval_secs > 0).then(|| Duration::from_secs(self.reload_interval_secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: PathBuf::from("train.csv"),
            preview_rows: 100,
            reload_interval_secs: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_parser() {
        let cfg = Config::try_parse_from(["bike-panda"]).unwrap();
        assert_eq!(cfg.preview_rows, Config::default().preview_rows);
        assert_eq!(cfg.reload_interval(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn zero_interval_disables_watching() {
        let cfg =
            Config::try_parse_from(["bike-panda", "day.csv", "--reload-interval-secs", "0"]).unwrap();
        assert_eq!(cfg.data, PathBuf::from("day.csv"));
        assert_eq!(cfg.reload_interval(), None);
    }
}
