//! Core functionality for the progress tracker.
//!
//! This module contains:
//! - Calendar bucketing of records into today/week/month ranges
//! - Aggregation of record metrics over a range
//! - Activity streaks and motivational advice
//! - Weight trends and the progress snapshot for export

pub mod aggregation;
pub mod bucketing;
pub mod motivation;
pub mod progress;
pub mod streak;
pub mod trend;

pub use aggregation::{aggregate, daily_totals, goal_progress, AggregateResult};
pub use bucketing::{local_day, range_for, today_in, RangeMode, TimeRange};
pub use motivation::{advise, Advice};
pub use progress::{
    DailyProgress, GoalProgress, ProgressBuilder, ProgressSnapshot, StreakSummary, TodayProgress,
};
pub use streak::{streak, streak_as_of, streak_run, StreakRun};
pub use trend::{weight_trend, WeightTrend};
