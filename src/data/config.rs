use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

// ---------------------------------------------------------------------------
// f(A) polynomial
// ---------------------------------------------------------------------------

/// Coefficients of the extraction-correction polynomial
/// `f(A) = ((a*G + b)*G + c)*G + d`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Default for FaCoefficients {
    fn default() -> Self {
        Self {
            a: 0.0000188792,
            b: 0.003646886,
            c: 1.001077,
            d: -0.01223565,
        }
    }
}

impl FaCoefficients {
    /// Evaluate the polynomial in Horner form.
    pub fn eval(&self, gravity: f64) -> f64 {
        ((self.a * gravity + self.b) * gravity + self.c) * gravity + self.d
    }
}

// ---------------------------------------------------------------------------
// Header patterns
// ---------------------------------------------------------------------------

/// Regular expressions used to classify header cells. Matching is always
/// case-insensitive; group 1 must capture the family, group 2 the number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderPatterns {
    pub average: String,
    pub level: String,
    pub material: String,
}

impl Default for HeaderPatterns {
    fn default() -> Self {
        Self {
            average: r"^(FST|BBT|RBT)\s*([0-9]+)\s*Average\s*(Plato|Gravity)\s*$".to_string(),
            level: r"^(FST|BBT|RBT)\s*([0-9]+)\s*Level\s*$".to_string(),
            material: r"^(FST|BBT|RBT)\s*([0-9]+)\s*Material\s*$".to_string(),
        }
    }
}

/// What to do when more than one average column maps to the same tank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateAveragePolicy {
    /// Every matching column produces records (totals double up).
    #[default]
    KeepAll,
    KeepFirst,
    KeepLast,
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Immutable tables and constants handed to the engine at construction.
///
/// `Default` carries the values the exports are produced with; a JSON file
/// may override any subset of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Material code → canonical material name.
    pub material_codes: BTreeMap<String, String>,
    /// Name given to blank or missing material cells.
    pub empty_material: String,
    pub fa_coefficients: FaCoefficients,
    pub header_patterns: HeaderPatterns,
    pub duplicate_averages: DuplicateAveragePolicy,
    /// Level change (hl) above which a variation counts as significant.
    pub level_change_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let material_codes = [
            ("7", "ichnusa"),
            ("8", "non filtrata"),
            ("9", "cruda"),
            ("28", "ambra limpida"),
            ("0", "vuoto"),
            ("10", "ich(prop)"),
            ("32", "Recovered Beer"),
            ("36", "Recovered Beer"),
            ("3", "NF Bottle"),
            ("1", "Ich Bottle"),
            ("2", "Ich Fusti"),
        ]
        .into_iter()
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect();

        Self {
            material_codes,
            empty_material: "(vuoto)".to_string(),
            fa_coefficients: FaCoefficients::default(),
            header_patterns: HeaderPatterns::default(),
            duplicate_averages: DuplicateAveragePolicy::default(),
            level_change_threshold: 10.0,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file. Fields absent from the file
    /// keep their default value.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fa_at_ten_matches_direct_evaluation() {
        let fa = FaCoefficients::default().eval(10.0);
        let direct = 0.0000188792 * 1000.0 + 0.003646886 * 100.0 + 1.001077 * 10.0 - 0.01223565;
        assert!((fa - direct).abs() < 1e-12);
        assert!((fa - 10.38210215).abs() < 1e-9, "got {fa}");
    }

    #[test]
    fn default_table_has_all_codes() {
        let config = EngineConfig::default();
        assert_eq!(config.material_codes.len(), 11);
        assert_eq!(config.material_codes["32"], "Recovered Beer");
        assert_eq!(config.material_codes["36"], "Recovered Beer");
        assert_eq!(config.empty_material, "(vuoto)");
        assert_eq!(config.duplicate_averages, DuplicateAveragePolicy::KeepAll);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "duplicate_averages": "keep_first", "level_change_threshold": 5.0 }"#,
        )
        .expect("valid config");
        assert_eq!(config.duplicate_averages, DuplicateAveragePolicy::KeepFirst);
        assert_eq!(config.level_change_threshold, 5.0);
        assert_eq!(config.fa_coefficients, FaCoefficients::default());
        assert_eq!(config.material_codes["7"], "ichnusa");
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(EngineConfig::from_json_str(r#"{ "duplicate_averages": "sum" }"#).is_err());
    }
}
