use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use tank_analyzer::data::daily;
use tank_analyzer::export::{self, DEFAULT_FILE_NAMES};
use tank_analyzer::{
    AnalysisReport, DailySeries, EngineConfig, FamilyFilter, TankDataset, TimeWindow, Totals,
    VariationRecord, VariationSummary,
};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Summary,
    Debug,
    Charts,
    Variations,
    Raw,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Summary, Tab::Debug, Tab::Charts, Tab::Variations, Tab::Raw];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Summary => "Summary",
            Tab::Debug => "Debug",
            Tab::Charts => "Charts",
            Tab::Variations => "Variations",
            Tab::Raw => "Raw data",
        }
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: EngineConfig,

    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<TankDataset>,
    pub source_path: Option<PathBuf>,

    /// Family checkboxes; take effect on the next apply.
    pub families: FamilyFilter,

    /// Days present in the dataset and the one being analysed.
    pub days: Vec<NaiveDate>,
    pub selected_day: Option<usize>,

    /// Results of the last apply.
    pub report: AnalysisReport,
    pub daily: DailySeries,
    pub material_colors: ColorMap,

    /// Cross-day or intra-day variations, computed on request only.
    pub variations: Vec<VariationRecord>,
    pub variation_tank: Option<String>,

    /// Leave empty tanks out of the totals.
    pub exclude_empty: bool,

    pub tab: Tab,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            dataset: None,
            source_path: None,
            families: FamilyFilter::all(),
            days: Vec::new(),
            selected_day: None,
            report: AnalysisReport::default(),
            daily: DailySeries::new(),
            material_colors: ColorMap::default(),
            variations: Vec::new(),
            variation_tank: None,
            exclude_empty: false,
            tab: Tab::Summary,
            status_message: None,
        }
    }

    pub fn open(&mut self, path: &Path) {
        match TankDataset::load(path, &self.config) {
            Ok(dataset) => self.set_dataset(dataset, Some(path.to_path_buf())),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a newly loaded dataset, select its first day and analyse it.
    pub fn set_dataset(&mut self, dataset: TankDataset, source_path: Option<PathBuf>) {
        self.days = dataset.days();
        self.selected_day = if self.days.is_empty() { None } else { Some(0) };
        self.variations.clear();
        self.variation_tank = None;
        self.dataset = Some(dataset);
        self.source_path = source_path;
        self.status_message = None;
        self.apply();
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected_day.and_then(|i| self.days.get(i).copied())
    }

    /// Recompute the report for the selected day and the daily series.
    ///
    /// Without any dated row the whole file is analysed as one window.
    pub fn apply(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let window = self
            .selected_date()
            .map(TimeWindow::day)
            .unwrap_or_else(TimeWindow::all);
        self.report = ds.analyze(window, self.families);
        self.daily = ds.analyze_all_days(self.families);
        self.material_colors = ColorMap::new(&daily::materials(&self.daily));
        log::info!(
            "analysed {:?}: {} records, {} tanks",
            self.selected_date(),
            self.report.debug_rows.len(),
            self.report.tank_rows.len()
        );
    }

    pub fn select_day(&mut self, index: usize) {
        if index < self.days.len() && self.selected_day != Some(index) {
            self.selected_day = Some(index);
            self.apply();
        }
    }

    pub fn previous_day(&mut self) {
        if let Some(i) = self.selected_day.filter(|&i| i > 0) {
            self.select_day(i - 1);
        }
    }

    pub fn next_day(&mut self) {
        if let Some(i) = self.selected_day {
            self.select_day(i + 1);
        }
    }

    /// Compute day-over-day variations with the current family filter.
    pub fn load_variations(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        self.variations = ds.daily_variations(self.families);
        if self
            .variation_tank
            .as_ref()
            .is_some_and(|t| !self.variations.iter().any(|v| &v.tank_key == t))
        {
            self.variation_tank = None;
        }
        self.status_message = if self.variations.is_empty() {
            Some("No variations: at least two days with data are needed".to_string())
        } else {
            None
        };
    }

    /// Reading-over-reading changes within the selected day.
    pub fn load_intraday_variations(&mut self) {
        self.variations = self.report.intraday_variations();
        self.variation_tank = None;
        self.status_message = if self.variations.is_empty() {
            Some("No variations: at least two dated readings of a tank are needed".to_string())
        } else {
            None
        };
    }

    pub fn totals(&self) -> Totals {
        self.report.totals(self.exclude_empty)
    }

    /// Variations shown under the current tank filter.
    pub fn visible_variations(&self) -> Vec<&VariationRecord> {
        self.variations
            .iter()
            .filter(|v| self.variation_tank.as_ref().map_or(true, |t| &v.tank_key == t))
            .collect()
    }

    pub fn variation_summary(&self) -> VariationSummary {
        VariationSummary::from_records(&self.variations, self.variation_tank.as_deref())
    }

    /// Tanks that have at least one variation, sorted.
    pub fn variation_tanks(&self) -> Vec<String> {
        let mut tanks: Vec<String> = self.variations.iter().map(|v| v.tank_key.clone()).collect();
        tanks.sort();
        tanks.dedup();
        tanks
    }

    /// Write every export next to the loaded file.
    pub fn export_all(&self) -> Result<Vec<PathBuf>> {
        let ds = self.dataset.as_ref().context("no dataset loaded")?;
        let dir = self
            .source_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let names = &DEFAULT_FILE_NAMES;

        Ok(vec![
            export::save(&dir, names.tanks, |f| export::write_tank_csv(f, &self.report.tank_rows))?,
            export::save(&dir, names.materials, |f| {
                export::write_material_csv(f, &self.report.material_rows)
            })?,
            export::save(&dir, names.debug, |f| export::write_debug_csv(f, &self.report.debug_rows))?,
            export::save(&dir, names.variations, |f| {
                export::write_variations_csv(f, &self.variations)
            })?,
            export::save(&dir, names.raw, |f| export::write_raw_csv(f, ds))?,
            export::save(&dir, names.report, |f| {
                export::write_report_json(f, &self.report, &self.daily, &self.variations)
            })?,
        ])
    }
}
