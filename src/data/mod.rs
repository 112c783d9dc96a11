/// Data layer: core types, loading, filtering, and the query surface.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (backend column names)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, immutable after load
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  query    │  resolve names → derive prefixes → filter → project
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ RecordSet │  frontend column names, materialized rows
///   └──────────┘
/// ```

pub mod derive;
pub mod filter;
pub mod loader;
pub mod model;
pub mod query;
pub mod stats;
