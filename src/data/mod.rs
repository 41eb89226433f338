/// Data layer: core types, loading, aggregation and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse + coerce rows → CarDataset
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ CarDataset  │  Vec<CarRecord>, brand groups, rejection tally
///   └────────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  group by key → sorted Vec<GroupSummary>
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  pinned / hovered category → mark emphasis
///   └──────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
