use std::collections::BTreeMap;
use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::config::{DuplicateAveragePolicy, EngineConfig};
use super::error::DatasetError;

// ---------------------------------------------------------------------------
// Family – tank category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Family {
    Fst,
    Bbt,
    Rbt,
}

impl Family {
    pub const ALL: [Family; 3] = [Family::Fst, Family::Bbt, Family::Rbt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Fst => "FST",
            Family::Bbt => "BBT",
            Family::Rbt => "RBT",
        }
    }

    /// Parse a family code, ignoring case.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(code.trim()))
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ColumnMap – resolved header layout
// ---------------------------------------------------------------------------

/// One "Average Gravity/Plato" column and the tank it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AverageColumn {
    pub index: usize,
    pub tank_key: String,
    pub family: Family,
}

/// Which column holds what, resolved once from the header row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    pub time_index: Option<usize>,
    /// In header order, after the duplicate policy has been applied.
    pub average_columns: Vec<AverageColumn>,
    pub level_index: BTreeMap<String, usize>,
    pub material_index: BTreeMap<String, usize>,
    /// Tank keys matched by more than one average column.
    pub duplicate_tanks: Vec<String>,
}

impl ColumnMap {
    pub fn has_time_column(&self) -> bool {
        self.time_index.is_some()
    }

    /// Distinct tank keys with an average column, sorted.
    pub fn tank_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .average_columns
            .iter()
            .map(|c| c.tank_key.clone())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

// ---------------------------------------------------------------------------
// ColumnResolver
// ---------------------------------------------------------------------------

/// Classifies header cells with the compiled patterns from [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct ColumnResolver {
    average: Regex,
    level: Regex,
    material: Regex,
    policy: DuplicateAveragePolicy,
}

fn compile(kind: &'static str, pattern: &str) -> Result<Regex, DatasetError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| DatasetError::Pattern { kind, source })
}

/// `(tank_key, family)` when `re` matches the header.
fn match_tank(re: &Regex, header: &str) -> Option<(String, Family)> {
    let caps = re.captures(header)?;
    let family = Family::from_code(caps.get(1)?.as_str())?;
    let number = caps.get(2)?.as_str();
    Some((format!("{}{}", family.as_str(), number), family))
}

impl ColumnResolver {
    pub fn new(config: &EngineConfig) -> Result<Self, DatasetError> {
        let patterns = &config.header_patterns;
        Ok(Self {
            average: compile("average", &patterns.average)?,
            level: compile("level", &patterns.level)?,
            material: compile("material", &patterns.material)?,
            policy: config.duplicate_averages,
        })
    }

    pub fn resolve<S: AsRef<str>>(&self, header: &[S]) -> ColumnMap {
        let mut map = ColumnMap {
            time_index: header
                .iter()
                .position(|h| h.as_ref().trim().to_lowercase() == "time"),
            ..ColumnMap::default()
        };

        for (idx, col) in header.iter().enumerate() {
            let col = col.as_ref();
            if let Some((tank_key, family)) = match_tank(&self.average, col) {
                map.average_columns.push(AverageColumn {
                    index: idx,
                    tank_key,
                    family,
                });
            }
            if let Some((tank_key, _)) = match_tank(&self.level, col) {
                map.level_index.insert(tank_key, idx);
            }
            if let Some((tank_key, _)) = match_tank(&self.material, col) {
                map.material_index.insert(tank_key, idx);
            }
        }

        map.duplicate_tanks = duplicate_keys(&map.average_columns);
        if !map.duplicate_tanks.is_empty() {
            log::warn!(
                "tanks with more than one average column: {:?} (policy {:?})",
                map.duplicate_tanks,
                self.policy
            );
            map.average_columns = apply_policy(map.average_columns, self.policy);
        }

        map
    }
}

fn duplicate_keys(columns: &[AverageColumn]) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for col in columns {
        *counts.entry(col.tank_key.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(k, _)| k.to_string())
        .collect()
}

fn apply_policy(columns: Vec<AverageColumn>, policy: DuplicateAveragePolicy) -> Vec<AverageColumn> {
    match policy {
        DuplicateAveragePolicy::KeepAll => columns,
        DuplicateAveragePolicy::KeepFirst => {
            let mut seen = std::collections::BTreeSet::new();
            columns
                .into_iter()
                .filter(|c| seen.insert(c.tank_key.clone()))
                .collect()
        }
        DuplicateAveragePolicy::KeepLast => {
            let last: BTreeMap<&str, usize> = columns
                .iter()
                .map(|c| (c.tank_key.as_str(), c.index))
                .collect();
            let keep: Vec<usize> = last.into_values().collect();
            columns
                .into_iter()
                .filter(|c| keep.contains(&c.index))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(policy: DuplicateAveragePolicy) -> ColumnResolver {
        let config = EngineConfig {
            duplicate_averages: policy,
            ..EngineConfig::default()
        };
        ColumnResolver::new(&config).expect("default patterns compile")
    }

    #[test]
    fn resolves_basic_header() {
        let header = ["Time", "FST1 Average Gravity", "FST1 Level", "FST1 Material"];
        let map = resolver(DuplicateAveragePolicy::KeepAll).resolve(&header);

        assert_eq!(map.time_index, Some(0));
        assert_eq!(
            map.average_columns,
            vec![AverageColumn {
                index: 1,
                tank_key: "FST1".to_string(),
                family: Family::Fst,
            }]
        );
        assert_eq!(map.level_index.get("FST1"), Some(&2));
        assert_eq!(map.material_index.get("FST1"), Some(&3));
        assert!(map.duplicate_tanks.is_empty());
    }

    #[test]
    fn patterns_ignore_case_and_spacing() {
        let header = [
            " TIME ",
            "bbt12average plato",
            "Rbt 3   Level  ",
            "rbt3 MATERIAL",
            "FST-1 Average Gravity",
            "FST1 Average Gravity Max",
        ];
        let map = resolver(DuplicateAveragePolicy::KeepAll).resolve(&header);

        assert_eq!(map.time_index, Some(0));
        assert_eq!(map.average_columns.len(), 1);
        assert_eq!(map.average_columns[0].tank_key, "BBT12");
        assert_eq!(map.average_columns[0].family, Family::Bbt);
        assert_eq!(map.level_index.get("RBT3"), Some(&2));
        assert_eq!(map.material_index.get("RBT3"), Some(&3));
    }

    #[test]
    fn missing_columns_degrade_gracefully() {
        let header = ["Stamp", "FST2 Average Gravity"];
        let map = resolver(DuplicateAveragePolicy::KeepAll).resolve(&header);

        assert_eq!(map.time_index, None);
        assert!(!map.has_time_column());
        assert_eq!(map.tank_keys(), vec!["FST2".to_string()]);
        assert!(map.level_index.is_empty());
        assert!(map.material_index.is_empty());
    }

    #[test]
    fn later_level_column_overwrites_earlier() {
        let header = ["FST1 Level", "FST1 Average Gravity", "FST1 Level"];
        let map = resolver(DuplicateAveragePolicy::KeepAll).resolve(&header);
        assert_eq!(map.level_index.get("FST1"), Some(&2));
    }

    #[test]
    fn first_time_column_wins() {
        let header = ["time", "Time"];
        let map = resolver(DuplicateAveragePolicy::KeepAll).resolve(&header);
        assert_eq!(map.time_index, Some(0));
    }

    #[test]
    fn number_is_kept_verbatim() {
        let header = ["FST01 Average Gravity", "FST1 Average Gravity"];
        let map = resolver(DuplicateAveragePolicy::KeepAll).resolve(&header);
        assert_eq!(map.tank_keys(), vec!["FST01".to_string(), "FST1".to_string()]);
        assert!(map.duplicate_tanks.is_empty());
    }

    #[test]
    fn duplicate_averages_follow_policy() {
        let header = [
            "Time",
            "FST1 Average Gravity",
            "FST2 Average Gravity",
            "FST1 Average Plato",
        ];

        let all = resolver(DuplicateAveragePolicy::KeepAll).resolve(&header);
        assert_eq!(all.duplicate_tanks, vec!["FST1".to_string()]);
        let indices: Vec<usize> = all.average_columns.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);

        let first = resolver(DuplicateAveragePolicy::KeepFirst).resolve(&header);
        let indices: Vec<usize> = first.average_columns.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(first.duplicate_tanks, vec!["FST1".to_string()]);

        let last = resolver(DuplicateAveragePolicy::KeepLast).resolve(&header);
        let indices: Vec<usize> = last.average_columns.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![2, 3]);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let mut config = EngineConfig::default();
        config.header_patterns.level = "(".to_string();
        let err = ColumnResolver::new(&config).unwrap_err();
        assert!(matches!(err, DatasetError::Pattern { kind: "level", .. }));
    }
}
