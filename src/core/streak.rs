//! Consecutive-day activity streaks.
//!
//! Records are walked newest first. Each record is judged on its own; entries
//! on the same day are not summed. A record that meets the goal extends the
//! chain and becomes the new reference day. Once a reference day exists, any
//! record whose day is not exactly the previous calendar day ends the walk.

use crate::records::store::RecordStore;
use crate::records::types::{Activity, Record};
use chrono::{Days, NaiveDate};

/// Streak length together with the day the chain was anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakRun {
    pub days: u32,
    /// Most recent qualifying day, `None` when nothing qualified.
    pub anchor: Option<NaiveDate>,
}

/// Count consecutive qualifying days, anchored on the newest qualifying record.
///
/// The anchor does not have to be today: a stale history still reports the
/// length of its newest run. Use [`streak_as_of`] when recency matters.
pub fn streak(store: &RecordStore<Activity>, daily_goal_minutes: u32) -> u32 {
    streak_run(store, daily_goal_minutes).days
}

/// Like [`streak`], but a chain whose anchor is older than yesterday counts as 0.
pub fn streak_as_of(
    store: &RecordStore<Activity>,
    daily_goal_minutes: u32,
    today: NaiveDate,
) -> u32 {
    let run = streak_run(store, daily_goal_minutes);
    let oldest_live_anchor = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    match run.anchor {
        Some(anchor) if anchor >= oldest_live_anchor => run.days,
        _ => 0,
    }
}

/// Walk the store and report the streak with its anchor day.
pub fn streak_run(store: &RecordStore<Activity>, daily_goal_minutes: u32) -> StreakRun {
    let mut newest_first: Vec<&Activity> = store.iter().collect();
    newest_first.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));

    let mut days = 0;
    let mut anchor = None;
    let mut previous: Option<NaiveDate> = None;

    for activity in newest_first {
        let day = store.day_of(activity);

        if let Some(prev) = previous {
            if prev.pred_opt() != Some(day) {
                break;
            }
        }

        if activity.active_minutes >= daily_goal_minutes {
            days += 1;
            previous = Some(day);
            if anchor.is_none() {
                anchor = Some(day);
            }
        }
    }

    StreakRun { days, anchor }
}
