//! Progress snapshot for presentation layers.
//!
//! A snapshot bundles everything a dashboard needs for one period: totals,
//! today's numbers against the daily goals, the streak, motivational advice,
//! the weight trend and a per-day breakdown.

use crate::config::Goals;
use crate::core::aggregation::{aggregate, daily_totals, goal_progress, AggregateResult};
use crate::core::bucketing::{range_for, RangeMode, TimeRange};
use crate::core::motivation::{advise, Advice};
use crate::core::streak::{streak_as_of, streak_run};
use crate::core::trend::{weight_trend, WeightTrend};
use crate::records::types::{Metric, WeightUnit};
use crate::session::{Stores, TrackerSession};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Fractions of goals achieved, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub active_minutes: f64,
    pub steps: f64,
    pub hydration: f64,
    pub protein: f64,
}

/// Today's totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodayProgress {
    pub date: NaiveDate,
    pub active_minutes: u32,
    pub steps: u32,
    pub ounces: f64,
    pub protein_grams: f64,
    pub goal_progress: GoalProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreakSummary {
    /// Newest run of consecutive qualifying days, however old
    pub days: u32,
    /// Same run, but 0 unless it reaches today or yesterday
    pub current: u32,
    pub anchor: Option<NaiveDate>,
}

/// One row of the per-day breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub active_minutes: f64,
    pub steps: f64,
    pub calories_burned: f64,
    pub ounces: f64,
    pub protein_grams: f64,
}

/// Progress for one period, ready to serialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub generated_at: DateTime<Utc>,
    pub user_id: String,
    pub mode: RangeMode,
    pub reference_date: NaiveDate,
    pub range: TimeRange,
    pub activity: AggregateResult,
    pub hydration: AggregateResult,
    pub nutrition: AggregateResult,
    pub today: TodayProgress,
    pub streak: StreakSummary,
    pub advice: Advice,
    pub message: String,
    pub goals: Goals,
    /// Period totals against the daily goals scaled by the number of days
    pub period_progress: GoalProgress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<WeightTrend>,
    pub daily: Vec<DailyProgress>,
}

/// Builder for progress snapshots.
#[derive(Debug, Clone)]
pub struct ProgressBuilder {
    goals: Goals,
    weight_unit: WeightUnit,
}

impl ProgressBuilder {
    pub fn new(goals: Goals) -> Self {
        Self {
            goals,
            weight_unit: WeightUnit::default(),
        }
    }

    /// Report weights in `unit`.
    pub fn with_weight_unit(mut self, unit: WeightUnit) -> Self {
        self.weight_unit = unit;
        self
    }

    pub fn goals(&self) -> &Goals {
        &self.goals
    }

    /// Build a snapshot of the session's records for the period containing `today`.
    pub fn build(&self, session: &TrackerSession, mode: RangeMode, today: NaiveDate) -> ProgressSnapshot {
        self.build_from_stores(session.user_id(), session.stores(), mode, today)
    }

    pub fn build_from_stores(
        &self,
        user_id: &str,
        stores: &Stores,
        mode: RangeMode,
        today: NaiveDate,
    ) -> ProgressSnapshot {
        let range = range_for(mode, today);
        let activity = aggregate(&stores.activities, &range);
        let hydration = aggregate(&stores.hydration, &range);
        let nutrition = aggregate(&stores.meals, &range);

        let today_progress = self.today_progress(stores, today);
        let advice = advise(today_progress.active_minutes, self.goals.daily_active_minutes);

        let run = streak_run(&stores.activities, self.goals.daily_active_minutes);
        let streak = StreakSummary {
            days: run.days,
            current: streak_as_of(&stores.activities, self.goals.daily_active_minutes, today),
            anchor: run.anchor,
        };

        let days = f64::from(range.day_count());
        let period_progress = GoalProgress {
            active_minutes: goal_progress(
                activity.total(Metric::ActiveMinutes),
                f64::from(self.goals.daily_active_minutes) * days,
            ),
            steps: goal_progress(
                activity.total(Metric::Steps),
                f64::from(self.goals.daily_steps) * days,
            ),
            hydration: goal_progress(hydration.total(Metric::Ounces), self.goals.daily_ounces * days),
            protein: goal_progress(
                nutrition.total(Metric::ProteinGrams),
                self.goals.daily_protein_grams * days,
            ),
        };

        ProgressSnapshot {
            generated_at: Utc::now(),
            user_id: user_id.to_string(),
            mode,
            reference_date: today,
            range,
            weight: weight_trend(&stores.weights, &range, self.weight_unit),
            daily: daily_breakdown(stores, &range),
            activity,
            hydration,
            nutrition,
            today: today_progress,
            streak,
            message: advice.message(),
            advice,
            goals: self.goals,
            period_progress,
        }
    }

    /// Build a snapshot and serialize it as pretty JSON.
    pub fn build_json(
        &self,
        session: &TrackerSession,
        mode: RangeMode,
        today: NaiveDate,
    ) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.build(session, mode, today))
    }

    fn today_progress(&self, stores: &Stores, today: NaiveDate) -> TodayProgress {
        let day = TimeRange::single_day(today);
        let activity = aggregate(&stores.activities, &day);
        let hydration = aggregate(&stores.hydration, &day);
        let nutrition = aggregate(&stores.meals, &day);

        let active_minutes = activity.total(Metric::ActiveMinutes);
        let steps = activity.total(Metric::Steps);
        let ounces = hydration.total(Metric::Ounces);
        let protein_grams = nutrition.total(Metric::ProteinGrams);

        TodayProgress {
            date: today,
            active_minutes: saturating_u32(active_minutes),
            steps: saturating_u32(steps),
            ounces,
            protein_grams,
            goal_progress: GoalProgress {
                active_minutes: goal_progress(
                    active_minutes,
                    f64::from(self.goals.daily_active_minutes),
                ),
                steps: goal_progress(steps, f64::from(self.goals.daily_steps)),
                hydration: goal_progress(ounces, self.goals.daily_ounces),
                protein: goal_progress(protein_grams, self.goals.daily_protein_grams),
            },
        }
    }
}

impl Default for ProgressBuilder {
    fn default() -> Self {
        Self::new(Goals::default())
    }
}

fn saturating_u32(total: f64) -> u32 {
    total.clamp(0.0, f64::from(u32::MAX)) as u32
}

fn daily_breakdown(stores: &Stores, range: &TimeRange) -> Vec<DailyProgress> {
    let activity = daily_totals(&stores.activities, range);
    let hydration = daily_totals(&stores.hydration, range);
    let nutrition = daily_totals(&stores.meals, range);

    range
        .days()
        .zip(activity)
        .zip(hydration)
        .zip(nutrition)
        .map(|(((date, a), h), n)| DailyProgress {
            date,
            active_minutes: a.total(Metric::ActiveMinutes),
            steps: a.total(Metric::Steps),
            calories_burned: a.total(Metric::CaloriesBurned),
            ounces: h.total(Metric::Ounces),
            protein_grams: n.total(Metric::ProteinGrams),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::types::{Activity, HydrationLog, Meal, RecordMeta, WeightEntry};
    use chrono::{TimeZone, Utc};
    use chrono_tz::Tz;

    fn at(day: u32, hour: u32) -> RecordMeta {
        let ts = Utc.with_ymd_and_hms(2024, 4, day, hour, 0, 0).unwrap();
        RecordMeta::new("patient-1", ts).unwrap()
    }

    fn stores() -> Stores {
        let mut stores = Stores::new(Tz::UTC);
        stores
            .activities
            .append(Activity::new(at(10, 8), 4000, 45, 300, "walk").unwrap())
            .unwrap();
        stores
            .activities
            .append(Activity::new(at(9, 8), 6000, 70, 420, "run").unwrap())
            .unwrap();
        stores
            .activities
            .append(Activity::new(at(8, 8), 8000, 60, 500, "cycle").unwrap())
            .unwrap();
        stores
            .hydration
            .append(HydrationLog::new(at(10, 9), 32.0).unwrap())
            .unwrap();
        stores
            .meals
            .append(Meal::new(at(10, 12), "Lentil soup", 25.0, None).unwrap())
            .unwrap();
        stores
            .weights
            .append(WeightEntry::new(at(8, 7), 180.0, WeightUnit::Pounds).unwrap())
            .unwrap();
        stores
    }

    fn wednesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 10).unwrap()
    }

    #[test]
    fn test_week_snapshot() {
        let snapshot =
            ProgressBuilder::default().build_from_stores("patient-1", &stores(), RangeMode::Week, wednesday());

        assert_eq!(snapshot.range.start, NaiveDate::from_ymd_opt(2024, 4, 8).unwrap());
        assert_eq!(snapshot.activity.total(Metric::ActiveMinutes), 175.0);
        assert_eq!(snapshot.activity.total(Metric::Steps), 18000.0);
        assert_eq!(snapshot.hydration.total(Metric::Ounces), 32.0);
        assert_eq!(snapshot.nutrition.total(Metric::ProteinGrams), 25.0);
        assert_eq!(snapshot.daily.len(), 7);
        assert_eq!(snapshot.daily[1].active_minutes, 70.0);
        assert_eq!(snapshot.weight.as_ref().map(|w| w.entries), Some(1));
    }

    #[test]
    fn test_today_and_advice() {
        let snapshot = ProgressBuilder::default().build_from_stores(
            "patient-1",
            &stores(),
            RangeMode::Today,
            wednesday(),
        );

        assert_eq!(snapshot.today.active_minutes, 45);
        assert_eq!(snapshot.advice, Advice::InProgress { remaining: 15 });
        assert!(snapshot.message.contains("15 more"));
        assert_eq!(snapshot.today.goal_progress.active_minutes, 0.75);
        assert_eq!(snapshot.today.goal_progress.hydration, 0.5);
    }

    #[test]
    fn test_streak_stops_at_short_day() {
        let snapshot =
            ProgressBuilder::default().build_from_stores("patient-1", &stores(), RangeMode::Week, wednesday());

        // Walk: Apr 10 (45, below goal) then Apr 9 (70) then Apr 8 (60).
        assert_eq!(snapshot.streak.days, 2);
        assert_eq!(snapshot.streak.anchor, NaiveDate::from_ymd_opt(2024, 4, 9));
        assert_eq!(snapshot.streak.current, 2);
    }

    #[test]
    fn test_period_goal_scaled_by_days() {
        let goals = Goals {
            daily_active_minutes: 25,
            ..Goals::default()
        };
        let snapshot = ProgressBuilder::new(goals).build_from_stores(
            "patient-1",
            &stores(),
            RangeMode::Week,
            wednesday(),
        );
        assert_eq!(snapshot.period_progress.active_minutes, 1.0);
        assert_eq!(snapshot.advice, Advice::GoalReached);
    }

    #[test]
    fn test_empty_stores_serialize() {
        let snapshot = ProgressBuilder::default()
            .with_weight_unit(WeightUnit::Kilograms)
            .build_from_stores("patient-1", &Stores::default(), RangeMode::Month, wednesday());

        assert_eq!(snapshot.advice, Advice::NotStarted);
        assert_eq!(snapshot.streak.days, 0);
        assert!(snapshot.weight.is_none());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["mode"], "month");
        assert_eq!(json["advice"]["tier"], "not_started");
        assert!(json.get("weight").is_none());
        assert_eq!(json["daily"].as_array().unwrap().len(), 30);
    }
}
