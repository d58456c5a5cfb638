//! Per-period totals computed from a record store.
//!
//! Aggregation is a linear scan over the records in range, summing each
//! metric independently. Empty ranges are normal and produce zero totals.

use crate::core::bucketing::TimeRange;
use crate::records::store::RecordStore;
use crate::records::types::{Metric, Record};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summed metrics over a range of days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub range: TimeRange,
    /// Total per metric; every metric of the record kind is present.
    pub totals: BTreeMap<Metric, f64>,
    /// Number of records that contributed
    pub record_count: usize,
}

impl AggregateResult {
    /// A result with every listed metric at zero.
    pub fn empty(range: TimeRange, metrics: &[Metric]) -> Self {
        Self {
            range,
            totals: metrics.iter().map(|m| (*m, 0.0)).collect(),
            record_count: 0,
        }
    }

    /// Total for `metric`, 0 if the metric was not aggregated.
    pub fn total(&self, metric: Metric) -> f64 {
        self.totals.get(&metric).copied().unwrap_or(0.0)
    }

    fn add<R: Record>(&mut self, record: &R) {
        for metric in R::METRICS {
            *self.totals.entry(*metric).or_insert(0.0) += record.metric(*metric);
        }
        self.record_count += 1;
    }
}

/// Sum every metric of the store's records falling inside `range`.
pub fn aggregate<R: Record>(store: &RecordStore<R>, range: &TimeRange) -> AggregateResult {
    let mut result = AggregateResult::empty(*range, R::METRICS);
    for record in store.records_in_range(range) {
        result.add(record);
    }
    result
}

/// One aggregate per calendar day of `range`, zero-filled, in date order.
pub fn daily_totals<R: Record>(store: &RecordStore<R>, range: &TimeRange) -> Vec<AggregateResult> {
    let mut by_day: BTreeMap<NaiveDate, AggregateResult> = range
        .days()
        .map(|day| (day, AggregateResult::empty(TimeRange::single_day(day), R::METRICS)))
        .collect();

    for record in store.records_in_range(range) {
        if let Some(bucket) = by_day.get_mut(&store.day_of(record)) {
            bucket.add(record);
        }
    }

    by_day.into_values().collect()
}

/// Fraction of a goal achieved, clamped to `[0, 1]`.
///
/// A goal of zero (or less) is always met.
pub fn goal_progress(total: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return 1.0;
    }
    (total / goal).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bucketing::{range_for, RangeMode};
    use crate::records::types::{Activity, HydrationLog, Meal, RecordMeta};
    use chrono::{TimeZone, Utc};

    fn meta(day: u32) -> RecordMeta {
        RecordMeta::new("patient-1", Utc.with_ymd_and_hms(2024, 4, day, 12, 0, 0).unwrap()).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
    }

    fn activity(day: u32, steps: u32, minutes: u32, calories: u32) -> Activity {
        Activity::new(meta(day), steps, minutes, calories, "walking").unwrap()
    }

    #[test]
    fn test_empty_store_totals_are_zero() {
        let store: RecordStore<Activity> = RecordStore::new();
        let result = aggregate(&store, &range_for(RangeMode::Month, date(10)));

        assert_eq!(result.record_count, 0);
        assert_eq!(result.totals.len(), 3);
        assert_eq!(result.total(Metric::Steps), 0.0);
        assert_eq!(result.total(Metric::ActiveMinutes), 0.0);
        assert_eq!(result.total(Metric::CaloriesBurned), 0.0);
    }

    #[test]
    fn test_sums_each_metric_within_range() {
        let mut store = RecordStore::new();
        // Week of Monday April 8 to Sunday April 14.
        store.append(activity(8, 4000, 30, 150)).unwrap();
        store.append(activity(14, 6000, 45, 220)).unwrap();
        store.append(activity(15, 9999, 99, 999)).unwrap();

        let result = aggregate(&store, &range_for(RangeMode::Week, date(10)));
        assert_eq!(result.record_count, 2);
        assert_eq!(result.total(Metric::Steps), 10_000.0);
        assert_eq!(result.total(Metric::ActiveMinutes), 75.0);
        assert_eq!(result.total(Metric::CaloriesBurned), 370.0);
    }

    #[test]
    fn test_insertion_order_does_not_change_totals() {
        let drinks = [8.0, 12.5, 16.0, 4.25];
        let mut forward = RecordStore::new();
        let mut backward = RecordStore::new();
        let logs: Vec<HydrationLog> = drinks
            .iter()
            .map(|oz| HydrationLog::new(meta(3), *oz).unwrap())
            .collect();
        for log in &logs {
            forward.append(log.clone()).unwrap();
        }
        for log in logs.iter().rev() {
            backward.append(log.clone()).unwrap();
        }

        let range = range_for(RangeMode::Today, date(3));
        assert_eq!(aggregate(&forward, &range), aggregate(&backward, &range));
        assert_eq!(aggregate(&forward, &range).total(Metric::Ounces), 40.75);
    }

    #[test]
    fn test_daily_totals_zero_fill_the_week() {
        let mut store = RecordStore::new();
        store.append(Meal::new(meta(9), "oats", 12.0, None).unwrap()).unwrap();
        store.append(Meal::new(meta(9), "chicken", 35.0, None).unwrap()).unwrap();
        store.append(Meal::new(meta(12), "tofu", 20.0, None).unwrap()).unwrap();

        let days = daily_totals(&store, &range_for(RangeMode::Week, date(10)));
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].range.start, date(8));
        assert_eq!(days[1].total(Metric::ProteinGrams), 47.0);
        assert_eq!(days[1].record_count, 2);
        assert_eq!(days[4].total(Metric::ProteinGrams), 20.0);
        assert_eq!(days[6].total(Metric::ProteinGrams), 0.0);
    }

    #[test]
    fn test_goal_progress_is_clamped() {
        assert_eq!(goal_progress(30.0, 60.0), 0.5);
        assert_eq!(goal_progress(90.0, 60.0), 1.0);
        assert_eq!(goal_progress(0.0, 60.0), 0.0);
        assert_eq!(goal_progress(0.0, 0.0), 1.0);
    }
}
