//! Calendar bucketing of records into today / week / month ranges.
//!
//! Ranges are whole calendar days, inclusive on both ends. Weeks start on
//! Monday. Calendar days are resolved in the user's configured timezone.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Period a summary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeMode {
    Today,
    Week,
    Month,
}

impl RangeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeMode::Today => "today",
            RangeMode::Week => "week",
            RangeMode::Month => "month",
        }
    }
}

impl FromStr for RangeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "today" | "day" => Ok(RangeMode::Today),
            "week" => Ok(RangeMode::Week),
            "month" => Ok(RangeMode::Month),
            other => Err(format!("unknown range mode '{other}' (expected today, week or month)")),
        }
    }
}

impl std::fmt::Display for RangeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeRange {
    /// Range from `start` to `end`; the bounds are swapped if given reversed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Check if a calendar day falls within this range.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Number of calendar days covered.
    pub fn day_count(&self) -> u32 {
        (self.end - self.start).num_days() as u32 + 1
    }

    /// Every day of the range in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Compute the range of `mode` containing `reference`.
///
/// Falls back to the single day `[reference, reference]` if calendar
/// arithmetic leaves the supported date range.
pub fn range_for(mode: RangeMode, reference: NaiveDate) -> TimeRange {
    let range = match mode {
        RangeMode::Today => Some(TimeRange::single_day(reference)),
        RangeMode::Week => week_containing(reference),
        RangeMode::Month => month_containing(reference),
    };
    range.unwrap_or_else(|| TimeRange::single_day(reference))
}

fn week_containing(reference: NaiveDate) -> Option<TimeRange> {
    let offset = u64::from(reference.weekday().num_days_from_monday());
    let start = reference.checked_sub_days(Days::new(offset))?;
    let end = start.checked_add_days(Days::new(6))?;
    Some(TimeRange { start, end })
}

fn month_containing(reference: NaiveDate) -> Option<TimeRange> {
    let start = reference.with_day(1)?;
    let end = start.checked_add_months(Months::new(1))?.pred_opt()?;
    Some(TimeRange { start, end })
}

/// Calendar day of an instant in `timezone`.
pub fn local_day(instant: DateTime<Utc>, timezone: Tz) -> NaiveDate {
    instant.with_timezone(&timezone).date_naive()
}

/// Today's calendar day in `timezone`.
pub fn today_in(timezone: Tz) -> NaiveDate {
    local_day(Utc::now(), timezone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_today_is_single_day() {
        let range = range_for(RangeMode::Today, date(2024, 7, 3));
        assert_eq!(range.start, date(2024, 7, 3));
        assert_eq!(range.end, date(2024, 7, 3));
        assert_eq!(range.day_count(), 1);
    }

    #[test]
    fn test_week_runs_monday_to_sunday_for_every_weekday() {
        // 2024-07-01 is a Monday.
        for offset in 0..7 {
            let reference = date(2024, 7, 1 + offset);
            let range = range_for(RangeMode::Week, reference);
            assert_eq!(range.start, date(2024, 7, 1), "reference {reference}");
            assert_eq!(range.end, date(2024, 7, 7), "reference {reference}");
            assert_eq!(range.start.weekday(), Weekday::Mon);
            assert_eq!(range.end.weekday(), Weekday::Sun);
            assert_eq!(range.day_count(), 7);
        }
    }

    #[test]
    fn test_week_crosses_month_and_year() {
        let range = range_for(RangeMode::Week, date(2025, 1, 1));
        assert_eq!(range.start, date(2024, 12, 30));
        assert_eq!(range.end, date(2025, 1, 5));
    }

    #[test]
    fn test_month_ends_on_last_calendar_day() {
        let leap = range_for(RangeMode::Month, date(2024, 2, 14));
        assert_eq!(leap.start, date(2024, 2, 1));
        assert_eq!(leap.end, date(2024, 2, 29));

        let common = range_for(RangeMode::Month, date(2023, 2, 28));
        assert_eq!(common.end, date(2023, 2, 28));

        let december = range_for(RangeMode::Month, date(2023, 12, 31));
        assert_eq!(december.start, date(2023, 12, 1));
        assert_eq!(december.end, date(2023, 12, 31));
    }

    #[test]
    fn test_start_never_after_end() {
        let mut day = date(2023, 1, 1);
        while day <= date(2024, 12, 31) {
            for mode in [RangeMode::Today, RangeMode::Week, RangeMode::Month] {
                let range = range_for(mode, day);
                assert!(range.start <= range.end);
                assert!(range.contains(day));
            }
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_overflow_falls_back_to_single_day() {
        let range = range_for(RangeMode::Month, NaiveDate::MAX);
        assert_eq!(range, TimeRange::single_day(NaiveDate::MAX));
    }

    #[test]
    fn test_days_iterates_inclusive() {
        let range = TimeRange::new(date(2024, 3, 30), date(2024, 3, 28));
        let days: Vec<_> = range.days().collect();
        assert_eq!(days, vec![date(2024, 3, 28), date(2024, 3, 29), date(2024, 3, 30)]);
    }

    #[test]
    fn test_local_day_uses_timezone() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
        assert_eq!(local_day(instant, Tz::UTC), date(2024, 1, 1));
        assert_eq!(local_day(instant, chrono_tz::America::New_York), date(2023, 12, 31));
    }

    #[test]
    fn test_range_mode_parsing() {
        assert_eq!("Week".parse::<RangeMode>().unwrap(), RangeMode::Week);
        assert_eq!("day".parse::<RangeMode>().unwrap(), RangeMode::Today);
        assert!("year".parse::<RangeMode>().is_err());
    }
}
