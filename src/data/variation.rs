//! Day-over-day and reading-over-reading changes of level and extracted
//! mass, per tank.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::extract::MeasurementRecord;

/// Change of one tank between two snapshots, keyed by the later day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariationRecord {
    pub day: NaiveDate,
    pub tank_key: String,
    /// Material at the later snapshot.
    pub material: String,
    pub level_prev: f64,
    pub level_curr: f64,
    /// `None` when the difference is not a finite number.
    pub delta_level: Option<f64>,
    pub gravity_prev: f64,
    pub gravity_curr: f64,
    pub kg_prev: f64,
    pub kg_curr: f64,
    pub delta_kg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Decrease,
    Increase,
    Steady,
}

impl VariationRecord {
    fn between(day: NaiveDate, prev: &MeasurementRecord, curr: &MeasurementRecord) -> Self {
        let delta_level = Some(curr.level - prev.level).filter(|d| d.is_finite());
        Self {
            day,
            tank_key: curr.tank_key.clone(),
            material: curr.material.clone(),
            level_prev: prev.level,
            level_curr: curr.level,
            delta_level,
            gravity_prev: prev.gravity,
            gravity_curr: curr.gravity,
            kg_prev: prev.kg_extracted,
            kg_curr: curr.kg_extracted,
            delta_kg: curr.kg_extracted - prev.kg_extracted,
        }
    }

    /// Classify the level change against a threshold (hl).
    pub fn trend(&self, threshold: f64) -> Trend {
        match self.delta_level {
            Some(d) if d < -threshold => Trend::Decrease,
            Some(d) if d > threshold => Trend::Increase,
            _ => Trend::Steady,
        }
    }
}

// ---------------------------------------------------------------------------
// Intra-day: consecutive readings
// ---------------------------------------------------------------------------

/// One record per consecutive pair of readings of each tank, in
/// chronological order. Meant for the records of a single day; untimed
/// records are skipped.
pub fn intraday_variations(records: &[MeasurementRecord]) -> Vec<VariationRecord> {
    let mut by_tank: BTreeMap<&str, Vec<(NaiveDateTime, &MeasurementRecord)>> = BTreeMap::new();
    for record in records {
        if let Some(ts) = record.timestamp {
            by_tank
                .entry(record.tank_key.as_str())
                .or_default()
                .push((ts, record));
        }
    }

    let mut out = Vec::new();
    for readings in by_tank.values_mut() {
        readings.sort_by_key(|(ts, _)| *ts);
        for pair in readings.windows(2) {
            let (_, prev) = pair[0];
            let (ts, curr) = pair[1];
            out.push(VariationRecord::between(ts.date(), prev, curr));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Cross-day: daily-last snapshots
// ---------------------------------------------------------------------------

/// Compare each tank's last reading of a day with its last reading of the
/// previous day that has data.
///
/// The day sequence is every day with at least one valid record, across
/// all tanks. A tank missing from either side of a pair gets no record for
/// that pair. Output is ordered by tank, then day.
pub fn daily_variations<I>(records: I) -> Vec<VariationRecord>
where
    I: IntoIterator<Item = MeasurementRecord>,
{
    let mut last: BTreeMap<String, BTreeMap<NaiveDate, (NaiveDateTime, MeasurementRecord)>> =
        BTreeMap::new();
    let mut days = BTreeSet::new();

    for record in records {
        let Some(ts) = record.timestamp else {
            continue;
        };
        let day = ts.date();
        days.insert(day);
        let per_day = last.entry(record.tank_key.clone()).or_default();
        // Ties go to the later-processed record.
        let newer = per_day.get(&day).map_or(true, |(stored, _)| ts >= *stored);
        if newer {
            per_day.insert(day, (ts, record));
        }
    }

    let days: Vec<NaiveDate> = days.into_iter().collect();
    let mut out = Vec::new();
    for per_day in last.values() {
        for pair in days.windows(2) {
            let (Some((_, prev)), Some((_, curr))) = (per_day.get(&pair[0]), per_day.get(&pair[1]))
            else {
                continue;
            };
            out.push(VariationRecord::between(pair[1], prev, curr));
        }
    }

    log::debug!("{} daily variations over {} days", out.len(), days.len());
    out
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Totals and extremes over a set of variations. Extremes start at zero,
/// so a set with only decreases reports a largest increase of 0.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VariationSummary {
    pub count: usize,
    pub total_delta_level: f64,
    pub total_delta_kg: f64,
    pub max_increase_level: f64,
    pub max_decrease_level: f64,
    pub max_increase_kg: f64,
    pub max_decrease_kg: f64,
}

impl VariationSummary {
    /// Summarize `records`, restricted to one tank when `tank` is given.
    pub fn from_records(records: &[VariationRecord], tank: Option<&str>) -> Self {
        records
            .iter()
            .filter(|v| tank.map_or(true, |t| v.tank_key == t))
            .fold(Self::default(), |mut s, v| {
                s.count += 1;
                if let Some(d) = v.delta_level {
                    s.total_delta_level += d;
                    s.max_increase_level = s.max_increase_level.max(d);
                    s.max_decrease_level = s.max_decrease_level.min(d);
                }
                s.total_delta_kg += v.delta_kg;
                s.max_increase_kg = s.max_increase_kg.max(v.delta_kg);
                s.max_decrease_kg = s.max_decrease_kg.min(v.delta_kg);
                s
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::columns::Family;

    fn record(tank: &str, timestamp: &str, level: f64, kg: f64) -> MeasurementRecord {
        MeasurementRecord {
            timestamp: Some(
                NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S")
                    .expect("test timestamp"),
            ),
            tank_key: tank.to_string(),
            family: Family::Fst,
            gravity: 10.0,
            level,
            material: "ichnusa".to_string(),
            f_a: 1.0,
            kg_extracted: kg,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("test date")
    }

    #[test]
    fn daily_last_snapshots_are_compared() {
        let vars = daily_variations(vec![
            record("FST1", "2024-03-01 18:00:00", 50.0, 100.0),
            record("FST1", "2024-03-01 06:00:00", 10.0, 999.0),
            record("FST1", "2024-03-02 12:00:00", 40.0, 80.0),
        ]);
        assert_eq!(vars.len(), 1);
        let v = &vars[0];
        assert_eq!(v.day, day("2024-03-02"));
        assert_eq!(v.tank_key, "FST1");
        assert_eq!(v.kg_prev, 100.0);
        assert_eq!(v.kg_curr, 80.0);
        assert_eq!(v.delta_kg, -20.0);
        assert_eq!(v.delta_level, Some(-10.0));
        assert_eq!(v.level_prev, 50.0);
    }

    #[test]
    fn gap_days_are_skipped_not_zero_filled() {
        let vars = daily_variations(vec![
            record("FST1", "2024-03-01 18:00:00", 50.0, 100.0),
            record("FST1", "2024-03-05 18:00:00", 30.0, 60.0),
        ]);
        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].day, day("2024-03-05"));
        assert_eq!(vars[0].delta_kg, -40.0);
    }

    #[test]
    fn tank_missing_on_previous_day_yields_nothing() {
        let vars = daily_variations(vec![
            record("FST2", "2024-03-01 08:00:00", 1.0, 1.0),
            record("FST1", "2024-03-02 08:00:00", 50.0, 100.0),
            record("FST2", "2024-03-02 08:00:00", 2.0, 3.0),
            record("FST1", "2024-03-03 08:00:00", 40.0, 80.0),
        ]);
        let keys: Vec<(&str, NaiveDate)> = vars.iter().map(|v| (v.tank_key.as_str(), v.day)).collect();
        assert_eq!(
            keys,
            vec![("FST1", day("2024-03-03")), ("FST2", day("2024-03-02"))]
        );
    }

    #[test]
    fn day_with_other_tanks_only_breaks_the_pair() {
        // 03-02 has data (FST2) but not for FST1, so FST1 gets no 01→03 record.
        let vars = daily_variations(vec![
            record("FST1", "2024-03-01 08:00:00", 50.0, 100.0),
            record("FST2", "2024-03-02 08:00:00", 2.0, 3.0),
            record("FST1", "2024-03-03 08:00:00", 40.0, 80.0),
        ]);
        assert!(vars.is_empty());
    }

    #[test]
    fn equal_timestamps_take_the_later_record() {
        let vars = daily_variations(vec![
            record("FST1", "2024-03-01 08:00:00", 1.0, 1.0),
            record("FST1", "2024-03-02 08:00:00", 2.0, 2.0),
            record("FST1", "2024-03-02 08:00:00", 3.0, 7.0),
        ]);
        assert_eq!(vars[0].kg_curr, 7.0);
    }

    #[test]
    fn intraday_pairs_in_time_order() {
        let records = vec![
            record("FST1", "2024-03-01 12:00:00", 30.0, 60.0),
            record("FST1", "2024-03-01 06:00:00", 10.0, 20.0),
            record("FST1", "2024-03-01 18:00:00", 25.0, 50.0),
            record("BBT1", "2024-03-01 06:00:00", 5.0, 5.0),
        ];
        let vars = intraday_variations(&records);
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].delta_level, Some(20.0));
        assert_eq!(vars[0].delta_kg, 40.0);
        assert_eq!(vars[1].delta_level, Some(-5.0));
        assert!(vars.iter().all(|v| v.tank_key == "FST1"));
    }

    #[test]
    fn trend_uses_strict_threshold() {
        let mut v = daily_variations(vec![
            record("FST1", "2024-03-01 08:00:00", 50.0, 1.0),
            record("FST1", "2024-03-02 08:00:00", 30.0, 1.0),
        ])
        .remove(0);
        assert_eq!(v.trend(10.0), Trend::Decrease);
        v.delta_level = Some(10.0);
        assert_eq!(v.trend(10.0), Trend::Steady);
        v.delta_level = Some(10.5);
        assert_eq!(v.trend(10.0), Trend::Increase);
        v.delta_level = None;
        assert_eq!(v.trend(10.0), Trend::Steady);
    }

    #[test]
    fn summary_totals_and_extremes() {
        let vars = daily_variations(vec![
            record("FST1", "2024-03-01 08:00:00", 50.0, 100.0),
            record("FST1", "2024-03-02 08:00:00", 30.0, 80.0),
            record("FST1", "2024-03-03 08:00:00", 45.0, 95.0),
            record("FST2", "2024-03-01 08:00:00", 10.0, 10.0),
            record("FST2", "2024-03-02 08:00:00", 5.0, 4.0),
        ]);

        let all = VariationSummary::from_records(&vars, None);
        assert_eq!(all.count, 3);
        assert_eq!(all.total_delta_level, -10.0);
        assert_eq!(all.total_delta_kg, -11.0);
        assert_eq!(all.max_increase_level, 15.0);
        assert_eq!(all.max_decrease_level, -20.0);
        assert_eq!(all.max_decrease_kg, -20.0);

        let fst2 = VariationSummary::from_records(&vars, Some("FST2"));
        assert_eq!(fst2.count, 1);
        assert_eq!(fst2.max_increase_kg, 0.0);
        assert_eq!(fst2.max_decrease_kg, -6.0);
    }
}
