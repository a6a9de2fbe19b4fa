//! Data layer: schema, loading, filtering, statistics and tracks.
//!
//! Architecture:
//! ```text
//!  .feather / .parquet / .csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse files → Table → typed rows
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ Datasets  │  metadata rows, peak records, HOF set
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  criteria → in-scope enhancers + their metadata
//!   └──────────┘
//!        │  peak slice of one enhancer (± cell type)
//!        ├──────────────┐
//!        ▼              ▼
//!   ┌──────────┐   ┌──────────┐
//!   │  stats    │   │  tracks   │  per-cell-type series, or fallback table
//!   └──────────┘   └──────────┘
//! ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
pub mod tracks;
