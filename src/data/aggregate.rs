use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::extract::MeasurementRecord;
use super::filter::{FamilyFilter, TimeWindow};
use super::variation::{self, VariationRecord};

// ---------------------------------------------------------------------------
// TankAggregate
// ---------------------------------------------------------------------------

/// Running totals for one tank plus a snapshot of its latest reading.
///
/// The snapshot follows processing order, not insertion or chronological
/// order alone: a timestamped record replaces it only when strictly newer
/// than the stored timestamp, while a record without a timestamp always
/// replaces it (and leaves the stored timestamp untouched).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TankAggregate {
    pub tank_key: String,
    pub last_gravity: f64,
    pub last_level: f64,
    pub last_material: String,
    pub last_timestamp: Option<NaiveDateTime>,
    pub sum_f_a: f64,
    pub sum_kg: f64,
    pub count: usize,
}

impl TankAggregate {
    pub fn from_record(record: &MeasurementRecord) -> Self {
        Self {
            tank_key: record.tank_key.clone(),
            last_gravity: record.gravity,
            last_level: record.level,
            last_material: record.material.clone(),
            last_timestamp: record.timestamp,
            sum_f_a: record.f_a,
            sum_kg: record.kg_extracted,
            count: 1,
        }
    }

    pub fn observe(&mut self, record: &MeasurementRecord) {
        self.sum_f_a += record.f_a;
        self.sum_kg += record.kg_extracted;
        self.count += 1;
        self.offer_snapshot(
            record.timestamp,
            record.gravity,
            record.level,
            &record.material,
        );
    }

    /// Fold `other` into `self`, treating `other` as processed after
    /// `self`. Sums and counts add; the snapshot follows [`Self::observe`].
    pub fn merge(&mut self, other: &TankAggregate) {
        self.sum_f_a += other.sum_f_a;
        self.sum_kg += other.sum_kg;
        self.count += other.count;
        self.offer_snapshot(
            other.last_timestamp,
            other.last_gravity,
            other.last_level,
            &other.last_material,
        );
    }

    fn offer_snapshot(
        &mut self,
        timestamp: Option<NaiveDateTime>,
        gravity: f64,
        level: f64,
        material: &str,
    ) {
        if let Some(ts) = timestamp {
            if self.last_timestamp.is_some_and(|last| ts <= last) {
                return;
            }
            self.last_timestamp = Some(ts);
        }
        self.last_gravity = gravity;
        self.last_level = level;
        self.last_material = material.to_string();
    }
}

// ---------------------------------------------------------------------------
// MaterialAggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialAggregate {
    pub material: String,
    pub sum_kg: f64,
    pub sum_f_a: f64,
    pub count: usize,
}

impl MaterialAggregate {
    pub fn new(material: &str) -> Self {
        Self {
            material: material.to_string(),
            sum_kg: 0.0,
            sum_f_a: 0.0,
            count: 0,
        }
    }

    pub fn observe(&mut self, record: &MeasurementRecord) {
        self.sum_kg += record.kg_extracted;
        self.sum_f_a += record.f_a;
        self.count += 1;
    }

    pub fn merge(&mut self, other: &MaterialAggregate) {
        self.sum_kg += other.sum_kg;
        self.sum_f_a += other.sum_f_a;
        self.count += other.count;
    }
}

/// Materials that mean "nothing in the tank": code `0` or its name.
pub fn is_empty_material(material: &str) -> bool {
    let m = material.trim();
    m == "0" || m.eq_ignore_ascii_case("vuoto")
}

// ---------------------------------------------------------------------------
// AnalysisReport
// ---------------------------------------------------------------------------

/// Grand totals over the material rows of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub kg: f64,
    pub f_a: f64,
    pub count: usize,
}

/// Output of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub window: TimeWindow,
    pub families: FamilyFilter,
    /// Sorted by `sum_kg` descending, then tank key.
    pub tank_rows: Vec<TankAggregate>,
    /// Sorted by `sum_kg` descending, then material name.
    pub material_rows: Vec<MaterialAggregate>,
    /// Every contributing record, by timestamp (untimed first).
    pub debug_rows: Vec<MeasurementRecord>,
}

impl AnalysisReport {
    /// Fold already filtered records, in processing order.
    pub fn from_records<I>(records: I, window: TimeWindow, families: FamilyFilter) -> Self
    where
        I: IntoIterator<Item = MeasurementRecord>,
    {
        let mut by_tank: BTreeMap<String, TankAggregate> = BTreeMap::new();
        let mut by_material: BTreeMap<String, MaterialAggregate> = BTreeMap::new();
        let mut debug_rows = Vec::new();

        for record in records {
            match by_tank.get_mut(&record.tank_key) {
                Some(agg) => agg.observe(&record),
                None => {
                    by_tank.insert(record.tank_key.clone(), TankAggregate::from_record(&record));
                }
            }
            by_material
                .entry(record.material.clone())
                .or_insert_with(|| MaterialAggregate::new(&record.material))
                .observe(&record);
            debug_rows.push(record);
        }

        let mut tank_rows: Vec<TankAggregate> = by_tank.into_values().collect();
        tank_rows.sort_by(|a, b| {
            b.sum_kg
                .total_cmp(&a.sum_kg)
                .then_with(|| a.tank_key.cmp(&b.tank_key))
        });

        let mut material_rows: Vec<MaterialAggregate> = by_material.into_values().collect();
        material_rows.sort_by(|a, b| {
            b.sum_kg
                .total_cmp(&a.sum_kg)
                .then_with(|| a.material.cmp(&b.material))
        });

        // Stable: records sharing a timestamp keep processing order.
        debug_rows.sort_by_key(|r| r.timestamp);

        log::debug!(
            "aggregated {} records into {} tanks, {} materials",
            debug_rows.len(),
            tank_rows.len(),
            material_rows.len()
        );

        Self {
            window,
            families,
            tank_rows,
            material_rows,
            debug_rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.debug_rows.is_empty()
    }

    /// Reading-over-reading changes per tank within this report's records.
    /// Meant for a single-day window.
    pub fn intraday_variations(&self) -> Vec<VariationRecord> {
        variation::intraday_variations(&self.debug_rows)
    }

    /// Sum of the material rows, optionally leaving out empty tanks.
    pub fn totals(&self, exclude_empty: bool) -> Totals {
        self.material_rows
            .iter()
            .filter(|m| !(exclude_empty && is_empty_material(&m.material)))
            .fold(Totals::default(), |acc, m| Totals {
                kg: acc.kg + m.sum_kg,
                f_a: acc.f_a + m.sum_f_a,
                count: acc.count + m.count,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::columns::Family;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("test timestamp")
    }

    fn record(
        tank: &str,
        timestamp: Option<&str>,
        level: f64,
        material: &str,
        kg: f64,
    ) -> MeasurementRecord {
        MeasurementRecord {
            timestamp: timestamp.map(ts),
            tank_key: tank.to_string(),
            family: Family::Fst,
            gravity: 10.0,
            level,
            material: material.to_string(),
            f_a: 1.0,
            kg_extracted: kg,
        }
    }

    fn report(records: Vec<MeasurementRecord>) -> AnalysisReport {
        AnalysisReport::from_records(records, TimeWindow::all(), FamilyFilter::all())
    }

    #[test]
    fn latest_timestamp_wins_snapshot() {
        let r = report(vec![
            record("FST1", Some("2024-03-01 10:00:00"), 8.0, "ichnusa", 8.0),
            record("FST1", Some("2024-03-01 06:00:00"), 5.0, "cruda", 5.0),
        ]);
        let tank = &r.tank_rows[0];
        assert_eq!(tank.last_level, 8.0);
        assert_eq!(tank.last_material, "ichnusa");
        assert_eq!(tank.last_timestamp, Some(ts("2024-03-01 10:00:00")));
        assert_eq!(tank.count, 2);
        assert_eq!(tank.sum_kg, 13.0);
        assert_eq!(tank.sum_f_a, 2.0);
    }

    #[test]
    fn equal_timestamp_keeps_first_snapshot() {
        let r = report(vec![
            record("FST1", Some("2024-03-01 10:00:00"), 5.0, "a", 1.0),
            record("FST1", Some("2024-03-01 10:00:00"), 8.0, "b", 1.0),
        ]);
        assert_eq!(r.tank_rows[0].last_level, 5.0);
    }

    #[test]
    fn untimed_record_wins_by_processing_order() {
        let r = report(vec![
            record("FST1", Some("2024-03-01 10:00:00"), 5.0, "a", 1.0),
            record("FST1", None, 8.0, "b", 1.0),
        ]);
        let tank = &r.tank_rows[0];
        assert_eq!(tank.last_level, 8.0);
        assert_eq!(tank.last_material, "b");
        // The stored timestamp is left as it was.
        assert_eq!(tank.last_timestamp, Some(ts("2024-03-01 10:00:00")));
    }

    #[test]
    fn timed_record_after_untimed_first_record_takes_over() {
        let r = report(vec![
            record("FST1", None, 5.0, "a", 1.0),
            record("FST1", Some("2024-03-01 01:00:00"), 8.0, "b", 1.0),
        ]);
        assert_eq!(r.tank_rows[0].last_level, 8.0);
    }

    #[test]
    fn tanks_sorted_by_kg_then_key() {
        let r = report(vec![
            record("FST2", None, 1.0, "a", 10.0),
            record("BBT1", None, 1.0, "a", 10.0),
            record("FST1", None, 1.0, "a", 30.0),
        ]);
        let keys: Vec<&str> = r.tank_rows.iter().map(|t| t.tank_key.as_str()).collect();
        assert_eq!(keys, vec!["FST1", "BBT1", "FST2"]);
    }

    #[test]
    fn materials_sorted_by_kg_then_name() {
        let r = report(vec![
            record("FST1", None, 1.0, "cruda", 5.0),
            record("FST2", None, 1.0, "ambra limpida", 5.0),
            record("FST3", None, 1.0, "ichnusa", 7.0),
            record("FST4", None, 1.0, "ichnusa", 1.0),
        ]);
        let names: Vec<&str> = r.material_rows.iter().map(|m| m.material.as_str()).collect();
        assert_eq!(names, vec!["ichnusa", "ambra limpida", "cruda"]);
        assert_eq!(r.material_rows[0].count, 2);
        assert_eq!(r.material_rows[0].sum_kg, 8.0);
    }

    #[test]
    fn debug_rows_untimed_first_then_chronological() {
        let r = report(vec![
            record("FST1", Some("2024-03-02 00:00:00"), 1.0, "a", 1.0),
            record("FST2", None, 1.0, "a", 1.0),
            record("FST3", Some("2024-03-01 00:00:00"), 1.0, "a", 1.0),
            record("FST4", None, 1.0, "a", 1.0),
        ]);
        let keys: Vec<&str> = r.debug_rows.iter().map(|d| d.tank_key.as_str()).collect();
        assert_eq!(keys, vec!["FST2", "FST4", "FST3", "FST1"]);
    }

    #[test]
    fn merge_matches_sequential_fold() {
        let records = vec![
            record("FST1", Some("2024-03-01 06:00:00"), 5.0, "a", 2.0),
            record("FST1", Some("2024-03-01 09:00:00"), 9.0, "b", 3.0),
            record("FST1", Some("2024-03-01 07:00:00"), 7.0, "c", 4.0),
        ];
        let mut left = TankAggregate::from_record(&records[0]);
        let mut right = TankAggregate::from_record(&records[1]);
        right.observe(&records[2]);
        left.merge(&right);

        let sequential = &report(records).tank_rows[0];
        assert_eq!(&left, sequential);
    }

    #[test]
    fn material_merge_adds() {
        let mut a = MaterialAggregate::new("x");
        a.observe(&record("FST1", None, 1.0, "x", 2.0));
        let mut b = MaterialAggregate::new("x");
        b.observe(&record("FST2", None, 1.0, "x", 3.0));
        a.merge(&b);
        assert_eq!(a.sum_kg, 5.0);
        assert_eq!(a.sum_f_a, 2.0);
        assert_eq!(a.count, 2);
    }

    #[test]
    fn intraday_variations_follow_debug_rows() {
        let r = report(vec![
            record("FST1", Some("2024-03-01 10:00:00"), 30.0, "a", 3.0),
            record("FST1", Some("2024-03-01 06:00:00"), 50.0, "a", 5.0),
            record("FST1", None, 1.0, "a", 1.0),
            record("FST2", Some("2024-03-01 06:00:00"), 9.0, "a", 9.0),
        ]);
        let vars = r.intraday_variations();
        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].tank_key, "FST1");
        assert_eq!(vars[0].delta_level, Some(-20.0));
        assert_eq!(vars[0].delta_kg, -2.0);
    }

    #[test]
    fn totals_can_skip_empty_tanks() {
        let r = report(vec![
            record("FST1", None, 1.0, "ichnusa", 5.0),
            record("FST2", None, 1.0, "vuoto", 2.0),
            record("FST3", None, 1.0, "0", 1.0),
            record("FST4", None, 1.0, "(vuoto)", 0.5),
        ]);
        let all = r.totals(false);
        assert_eq!(all.kg, 8.5);
        assert_eq!(all.count, 4);

        let filled = r.totals(true);
        assert_eq!(filled.kg, 5.5);
        assert_eq!(filled.count, 2);
    }
}
