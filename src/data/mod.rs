/// Data layer: header resolution, cell parsing, and the aggregations.
///
/// Architecture:
/// ```text
///   tank export .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read rows, resolve columns → TankDataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  extract  │  row × average column → MeasurementRecord
///   └──────────┘
///        │
///        ├──────────────┬──────────────┐
///        ▼              ▼              ▼
///   ┌──────────┐  ┌──────────┐  ┌───────────┐
///   │ aggregate │  │  daily    │  │ variation  │
///   └──────────┘  └──────────┘  └───────────┘
/// ```

pub mod aggregate;
pub mod columns;
pub mod config;
pub mod daily;
pub mod error;
pub mod extract;
pub mod filter;
pub mod loader;
pub mod material;
pub mod model;
pub mod parse;
pub mod variation;
