//! Weight trend over a range of days.

use crate::core::bucketing::TimeRange;
use crate::records::store::RecordStore;
use crate::records::types::{Record, WeightEntry, WeightUnit};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Summary of the weight entries inside a range, in a single unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTrend {
    pub unit: WeightUnit,
    pub entries: usize,
    /// Oldest measurement in the range
    pub earliest: f64,
    /// Newest measurement in the range
    pub latest: f64,
    /// `latest - earliest`; negative means weight lost
    pub change: f64,
    pub mean: f64,
    /// Sample standard deviation, 0 with fewer than two entries
    pub std_dev: f64,
    pub lowest: f64,
    pub highest: f64,
}

/// Summarize weights logged inside `range`, converted to `unit`.
///
/// Returns `None` when no weight was logged in the range.
pub fn weight_trend(
    store: &RecordStore<WeightEntry>,
    range: &TimeRange,
    unit: WeightUnit,
) -> Option<WeightTrend> {
    let mut entries = store.records_in_range(range);
    if entries.is_empty() {
        return None;
    }
    entries.sort_by_key(|e| e.timestamp());

    let values: Vec<f64> = entries.iter().map(|e| e.value_in(unit)).collect();
    let earliest = values[0];
    let latest = values[values.len() - 1];
    let lowest = values.iter().copied().fold(f64::INFINITY, f64::min);
    let highest = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let std_dev = if values.len() < 2 {
        0.0
    } else {
        values.iter().std_dev()
    };

    Some(WeightTrend {
        unit,
        entries: values.len(),
        earliest,
        latest,
        change: latest - earliest,
        mean: values.iter().mean(),
        std_dev,
        lowest,
        highest,
    })
}
