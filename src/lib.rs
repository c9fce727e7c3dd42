pub mod data;
pub mod export;

pub use data::aggregate::{AnalysisReport, MaterialAggregate, TankAggregate, Totals};
pub use data::columns::{AverageColumn, ColumnMap, ColumnResolver, Family};
pub use data::config::{DuplicateAveragePolicy, EngineConfig, FaCoefficients};
pub use data::daily::{DailyBucket, DailySeries};
pub use data::error::{ConfigError, DatasetError};
pub use data::extract::{MeasurementRecord, RowExtractor};
pub use data::filter::{FamilyFilter, TimeWindow};
pub use data::model::TankDataset;
pub use data::variation::{Trend, VariationRecord, VariationSummary};
