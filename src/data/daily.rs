use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use super::extract::MeasurementRecord;

/// Extracted mass of one calendar day, with two breakdowns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyBucket {
    pub total_kg: f64,
    pub by_material: BTreeMap<String, f64>,
    pub by_tank: BTreeMap<String, f64>,
}

impl DailyBucket {
    pub fn add(&mut self, record: &MeasurementRecord) {
        self.total_kg += record.kg_extracted;
        *self.by_material.entry(record.material.clone()).or_default() += record.kg_extracted;
        *self.by_tank.entry(record.tank_key.clone()).or_default() += record.kg_extracted;
    }

    pub fn merge(&mut self, other: &DailyBucket) {
        self.total_kg += other.total_kg;
        for (material, kg) in &other.by_material {
            *self.by_material.entry(material.clone()).or_default() += kg;
        }
        for (tank, kg) in &other.by_tank {
            *self.by_tank.entry(tank.clone()).or_default() += kg;
        }
    }
}

/// Day → bucket, iterated in calendar order. Days display as `YYYY-MM-DD`.
pub type DailySeries = BTreeMap<NaiveDate, DailyBucket>;

/// Bucket records by the calendar day of their timestamp. Untimed records
/// cannot be placed and are skipped.
pub fn rollup<I>(records: I) -> DailySeries
where
    I: IntoIterator<Item = MeasurementRecord>,
{
    let mut series = DailySeries::new();
    for record in records {
        let Some(ts) = record.timestamp else {
            continue;
        };
        series.entry(ts.date()).or_default().add(&record);
    }
    series
}

/// Every material that appears in the series, sorted.
pub fn materials(series: &DailySeries) -> BTreeSet<String> {
    series
        .values()
        .flat_map(|bucket| bucket.by_material.keys().cloned())
        .collect()
}

/// Per-tank kg summed over all days.
pub fn tank_totals(series: &DailySeries) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for bucket in series.values() {
        for (tank, kg) in &bucket.by_tank {
            *totals.entry(tank.clone()).or_default() += kg;
        }
    }
    totals
}

/// Per-material kg summed over all days.
pub fn material_totals(series: &DailySeries) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for bucket in series.values() {
        for (material, kg) in &bucket.by_material {
            *totals.entry(material.clone()).or_default() += kg;
        }
    }
    totals
}

/// The `n` keys with the largest totals; ties go to the smaller key.
pub fn top_keys(totals: &BTreeMap<String, f64>, n: usize) -> Vec<String> {
    let mut ranked: Vec<(&String, f64)> = totals.iter().map(|(k, v)| (k, *v)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().take(n).map(|(k, _)| k.clone()).collect()
}

/// One value per day for `key` in the breakdown chosen by `pick`; days
/// where the key is absent count as 0.
pub fn zero_filled<F>(series: &DailySeries, key: &str, pick: F) -> Vec<(NaiveDate, f64)>
where
    F: Fn(&DailyBucket) -> &BTreeMap<String, f64>,
{
    series
        .iter()
        .map(|(day, bucket)| (*day, pick(bucket).get(key).copied().unwrap_or(0.0)))
        .collect()
}
