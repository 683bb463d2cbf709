use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures while loading the rental source.
///
/// Any of these halts the session: no record set is derived and no
/// dashboard is rendered.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("data source not found: {}", .path.display())]
    DataSourceNotFound { path: PathBuf },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}, column '{column}': invalid value '{value}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl DataError {
    /// Map an I/O failure on `path`, singling out a missing file.
    pub fn from_io(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            DataError::DataSourceNotFound {
                path: path.to_path_buf(),
            }
        } else {
            DataError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn invalid(row: usize, column: &str, value: impl Into<String>) -> Self {
        DataError::InvalidValue {
            row,
            column: column.to_string(),
            value: value.into(),
        }
    }
}

/// Non-fatal conditions raised while deriving or aggregating.
///
/// These are never returned as `Err`; the caller gets a "no data" value and
/// the warning is logged (and may be shown by the presentation layer).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateWarning {
    #[error("{aggregate}: filtered view is empty")]
    EmptyAggregate { aggregate: &'static str },

    #[error("{aggregate}: sum exceeds u64, saturated")]
    Overflow { aggregate: &'static str },

    #[error("correlation undefined for '{field}': zero variance")]
    ZeroVariance { field: String },

    #[error("unknown {kind} code {code} in {rows} row(s), grouped as Unknown")]
    UndefinedCategory {
        kind: &'static str,
        code: i64,
        rows: usize,
    },
}
