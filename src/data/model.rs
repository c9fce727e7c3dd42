use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use super::aggregate::AnalysisReport;
use super::columns::{ColumnMap, ColumnResolver};
use super::config::EngineConfig;
use super::daily::{self, DailySeries};
use super::error::DatasetError;
use super::extract::{MeasurementRecord, RowExtractor};
use super::filter::{FamilyFilter, TimeWindow};
use super::parse::parse_timestamp;
use super::variation::{self, VariationRecord};

// ---------------------------------------------------------------------------
// TankDataset – the complete loaded export
// ---------------------------------------------------------------------------

/// A loaded tank export: raw rows plus the column layout resolved from
/// the header. Read-only once built; every analysis is a fresh scan.
#[derive(Debug, Clone)]
pub struct TankDataset {
    /// Trimmed header cells.
    pub header: Vec<String>,
    /// Data rows as read; widths may differ from the header.
    pub rows: Vec<StringRecord>,
    pub columns: ColumnMap,
    config: EngineConfig,
    extractor: RowExtractor,
    time_range: Option<(NaiveDateTime, NaiveDateTime)>,
}

impl TankDataset {
    /// Resolve columns and the date range for already split rows.
    pub fn new(
        header: Vec<String>,
        rows: Vec<StringRecord>,
        config: &EngineConfig,
    ) -> Result<Self, DatasetError> {
        let columns = ColumnResolver::new(config)?.resolve(&header);

        if columns.time_index.is_none() {
            log::warn!("no Time column: time filtering, daily totals and variations are unavailable");
        }
        let tanks = columns.tank_keys();
        for tank in &tanks {
            if !columns.level_index.contains_key(tank) {
                log::info!("{tank} has no Level column, level defaults to 0");
            }
            if !columns.material_index.contains_key(tank) {
                log::info!("{tank} has no Material column");
            }
        }
        log::debug!("resolved columns: {columns:?}");

        let mut dataset = Self {
            header,
            rows,
            columns,
            config: config.clone(),
            extractor: RowExtractor::new(config),
            time_range: None,
        };
        dataset.time_range = dataset.compute_time_range();
        Ok(dataset)
    }

    fn compute_time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.rows
            .iter()
            .filter_map(|row| self.row_timestamp(row))
            .fold(None, |range, ts| match range {
                None => Some((ts, ts)),
                Some((lo, hi)) => Some((lo.min(ts), hi.max(ts))),
            })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_time_column(&self) -> bool {
        self.columns.has_time_column()
    }

    /// Earliest and latest parseable timestamps.
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.time_range
    }

    pub fn min_time(&self) -> Option<NaiveDateTime> {
        self.time_range.map(|(lo, _)| lo)
    }

    pub fn max_time(&self) -> Option<NaiveDateTime> {
        self.time_range.map(|(_, hi)| hi)
    }

    /// Parsed Time cell of a row, if the dataset has a Time column.
    pub fn row_timestamp(&self, row: &StringRecord) -> Option<NaiveDateTime> {
        let idx = self.columns.time_index?;
        parse_timestamp(row.get(idx)?)
    }

    /// Distinct calendar days with a parseable timestamp, ascending.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.rows
            .iter()
            .filter_map(|row| self.row_timestamp(row))
            .map(|ts| ts.date())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Valid records in processing order: row by row, and within a row in
    /// header order of the average columns.
    pub fn records(
        &self,
        window: TimeWindow,
        families: FamilyFilter,
    ) -> impl Iterator<Item = MeasurementRecord> + '_ {
        let has_time = self.has_time_column();
        self.rows.iter().flat_map(move |row| {
            let ts = self.row_timestamp(row);
            let admitted = window.admits(has_time, ts);
            self.columns
                .average_columns
                .iter()
                .filter(move |col| admitted && families.admits(col.family))
                .filter_map(move |col| self.extractor.extract(row, col, &self.columns, ts))
        })
    }

    /// Per-tank and per-material aggregates over a time window.
    pub fn analyze(&self, window: TimeWindow, families: FamilyFilter) -> AnalysisReport {
        AnalysisReport::from_records(self.records(window, families), window, families)
    }

    /// Per-day totals over the whole file. Empty without a Time column.
    pub fn analyze_all_days(&self, families: FamilyFilter) -> DailySeries {
        if !self.has_time_column() {
            return DailySeries::new();
        }
        daily::rollup(self.records(TimeWindow::all(), families))
    }

    /// Day-over-day changes from each tank's last reading per day.
    pub fn daily_variations(&self, families: FamilyFilter) -> Vec<VariationRecord> {
        if !self.has_time_column() {
            return Vec::new();
        }
        variation::daily_variations(self.records(TimeWindow::all(), families))
    }
}
