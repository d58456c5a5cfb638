//! Tiered feedback on today's activity against the daily goal.

use serde::{Deserialize, Serialize};

/// Feedback tier for today's active minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum Advice {
    GoalReached,
    InProgress { remaining: u32 },
    NotStarted,
}

impl Advice {
    /// Message shown to the patient for this tier.
    pub fn message(&self) -> String {
        match self {
            Advice::GoalReached => "Great job! You've reached your activity goal for today.".to_string(),
            Advice::InProgress { remaining } => {
                format!("You're on your way! {remaining} more active minutes to reach today's goal.")
            }
            Advice::NotStarted => {
                "Let's get moving! Even a short walk counts toward today's goal.".to_string()
            }
        }
    }
}

/// Pick the feedback tier for today's total against the goal.
pub fn advise(today_total_minutes: u32, daily_goal_minutes: u32) -> Advice {
    if today_total_minutes >= daily_goal_minutes {
        Advice::GoalReached
    } else if today_total_minutes > 0 {
        Advice::InProgress {
            remaining: daily_goal_minutes - today_total_minutes,
        }
    } else {
        Advice::NotStarted
    }
}
