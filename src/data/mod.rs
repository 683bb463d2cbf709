/// Data layer: core types, loading, derivation, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<RawRecord>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  derive   │  calendar + label fields → EnrichedDataset
///   └──────────┘
///        │            (held by `cache` as an Arc snapshot)
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSpec → FilteredView
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  totals, group means, box stats, correlation
///   └───────────┘
/// ```

pub mod aggregate;
pub mod cache;
pub mod derive;
pub mod filter;
pub mod loader;
pub mod model;
