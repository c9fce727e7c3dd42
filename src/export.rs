//! CSV and JSON writers for the analysis outputs.
//!
//! Numbers are written with fixed decimals: gravity and level 2, f(A) 6,
//! kg 3. Timestamps use `%Y-%m-%d %H:%M:%S`; untimed rows get an empty cell.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::data::aggregate::{AnalysisReport, MaterialAggregate, TankAggregate};
use crate::data::daily::DailySeries;
use crate::data::extract::MeasurementRecord;
use crate::data::model::TankDataset;
use crate::data::variation::VariationRecord;

/// Default file names, one per export.
pub struct DefaultFileNames {
    pub tanks: &'static str,
    pub materials: &'static str,
    pub debug: &'static str,
    pub variations: &'static str,
    pub raw: &'static str,
    pub report: &'static str,
}

pub const DEFAULT_FILE_NAMES: DefaultFileNames = DefaultFileNames {
    tanks: "per_tank_gravity_volume_material_fa_kg.csv",
    materials: "per_material_sum_kg_fa.csv",
    debug: "debug_calculation_detail.csv",
    variations: "level_kg_variations.csv",
    raw: "raw_data.csv",
    report: "tank_report.json",
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn fixed(v: f64, decimals: usize) -> String {
    format!("{v:.decimals$}")
}

fn opt_fixed(v: Option<f64>, decimals: usize) -> String {
    v.map(|v| fixed(v, decimals)).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// CSV writers
// ---------------------------------------------------------------------------

pub fn write_tank_csv<W: Write>(writer: W, rows: &[TankAggregate]) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record([
        "tank",
        "material",
        "gravity_last",
        "level_last",
        "sum_f_a",
        "kg_extracted",
        "measurements",
    ])?;
    for row in rows {
        w.write_record([
            row.tank_key.clone(),
            row.last_material.clone(),
            fixed(row.last_gravity, 2),
            fixed(row.last_level, 2),
            fixed(row.sum_f_a, 6),
            fixed(row.sum_kg, 3),
            row.count.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_material_csv<W: Write>(writer: W, rows: &[MaterialAggregate]) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(["material", "kg_extracted", "sum_f_a", "measurements"])?;
    for row in rows {
        w.write_record([
            row.material.clone(),
            fixed(row.sum_kg, 3),
            fixed(row.sum_f_a, 6),
            row.count.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_debug_csv<W: Write>(writer: W, rows: &[MeasurementRecord]) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record([
        "timestamp",
        "tank",
        "material",
        "gravity",
        "level_hl",
        "f_a",
        "kg_extracted",
    ])?;
    for row in rows {
        w.write_record([
            row.timestamp
                .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
            row.tank_key.clone(),
            row.material.clone(),
            fixed(row.gravity, 2),
            fixed(row.level, 2),
            fixed(row.f_a, 6),
            fixed(row.kg_extracted, 3),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_variations_csv<W: Write>(writer: W, rows: &[VariationRecord]) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record([
        "day",
        "tank",
        "material",
        "level_prev_hl",
        "level_curr_hl",
        "delta_level_hl",
        "gravity_prev",
        "gravity_curr",
        "kg_prev",
        "kg_curr",
        "delta_kg",
    ])?;
    for row in rows {
        w.write_record([
            row.day.to_string(),
            row.tank_key.clone(),
            row.material.clone(),
            fixed(row.level_prev, 2),
            fixed(row.level_curr, 2),
            opt_fixed(row.delta_level, 2),
            fixed(row.gravity_prev, 2),
            fixed(row.gravity_curr, 2),
            fixed(row.kg_prev, 3),
            fixed(row.kg_curr, 3),
            fixed(row.delta_kg, 3),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// The loaded rows, unchanged, behind the trimmed header.
pub fn write_raw_csv<W: Write>(writer: W, dataset: &TankDataset) -> Result<()> {
    let mut w = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(writer);
    w.write_record(&dataset.header)?;
    for row in &dataset.rows {
        w.write_record(row)?;
    }
    w.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON report
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct JsonReport<'a> {
    report: &'a AnalysisReport,
    daily: &'a DailySeries,
    variations: &'a [VariationRecord],
}

/// Aggregates, daily series and variations in one JSON document.
pub fn write_report_json<W: Write>(
    writer: W,
    report: &AnalysisReport,
    daily: &DailySeries,
    variations: &[VariationRecord],
) -> Result<()> {
    let doc = JsonReport {
        report,
        daily,
        variations,
    };
    serde_json::to_writer_pretty(writer, &doc).context("serializing report")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

/// Create `dir/name` and hand it to `write`.
pub fn save<F>(dir: &Path, name: &str, write: F) -> Result<PathBuf>
where
    F: FnOnce(File) -> Result<()>,
{
    let path = dir.join(name);
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    write(file).with_context(|| format!("writing {}", path.display()))?;
    log::info!("exported {}", path.display());
    Ok(path)
}
