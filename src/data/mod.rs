/// Data layer: core types, loading, enrichment and filtering.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → TrackTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  enrich  │  album → release year (Option)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  year cutoff + exclusion → LabeledTrack (with era)
///   └──────────┘
/// ```

pub mod enrich;
pub mod filter;
pub mod loader;
pub mod model;
pub mod sample;
