use chrono::NaiveDateTime;
use csv::StringRecord;
use serde::Serialize;

use super::columns::{AverageColumn, ColumnMap, Family};
use super::config::{EngineConfig, FaCoefficients};
use super::material::MaterialNormalizer;
use super::parse::parse_number;

/// One validated reading of one tank in one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRecord {
    pub timestamp: Option<NaiveDateTime>,
    pub tank_key: String,
    pub family: Family,
    pub gravity: f64,
    /// Hectoliters, never negative.
    pub level: f64,
    pub material: String,
    pub f_a: f64,
    /// `f_a * level`
    pub kg_extracted: f64,
}

/// Missing, NaN and negative levels count as an empty tank.
pub fn sanitize_level(level: Option<f64>) -> f64 {
    match level {
        Some(v) if v >= 0.0 => v,
        _ => 0.0,
    }
}

/// Turns a raw row plus one tank's columns into a [`MeasurementRecord`].
#[derive(Debug, Clone)]
pub struct RowExtractor {
    coefficients: FaCoefficients,
    materials: MaterialNormalizer,
}

impl RowExtractor {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            coefficients: config.fa_coefficients,
            materials: MaterialNormalizer::new(config),
        }
    }

    pub fn materials(&self) -> &MaterialNormalizer {
        &self.materials
    }

    pub fn f_a(&self, gravity: f64) -> f64 {
        self.coefficients.eval(gravity)
    }

    /// `None` when the gravity cell is missing, unparsable or non-finite,
    /// or when f(A) is not finite. Level and material fall back to their
    /// defaults instead of rejecting the row.
    pub fn extract(
        &self,
        row: &StringRecord,
        column: &AverageColumn,
        columns: &ColumnMap,
        timestamp: Option<NaiveDateTime>,
    ) -> Option<MeasurementRecord> {
        let gravity = parse_number(row.get(column.index)?).filter(|g| g.is_finite())?;
        let f_a = Some(self.f_a(gravity)).filter(|v| v.is_finite())?;

        let level = columns
            .level_index
            .get(&column.tank_key)
            .and_then(|&idx| row.get(idx))
            .and_then(parse_number);
        let level = sanitize_level(level);

        let material = columns
            .material_index
            .get(&column.tank_key)
            .and_then(|&idx| row.get(idx));
        let material = self.materials.normalize(material);

        Some(MeasurementRecord {
            timestamp,
            tank_key: column.tank_key.clone(),
            family: column.family,
            gravity,
            level,
            material,
            f_a,
            kg_extracted: f_a * level,
        })
    }
}
