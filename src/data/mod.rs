/// Data layer: core types, loading, filtering, aggregation, presentation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → DisasterDataset   (memoized by `cache`)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  years ∧ types ∧ geography → FilteredView
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate │  group by 1–2 dimensions → count / sum totals
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ present   │  tables, pivots, chart series
///   └──────────┘
/// ```

pub mod aggregate;
pub mod cache;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod present;
