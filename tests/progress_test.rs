//! End-to-end checks of bucketing, aggregation, streaks and advice

use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use std::sync::Arc;
use synheart_progress::core::{
    advise, aggregate, range_for, streak, streak_as_of, Advice, ProgressBuilder, RangeMode,
    TimeRange,
};
use synheart_progress::persistence::MemoryProvider;
use synheart_progress::records::{Activity, Metric, Record, RecordMeta, RecordStore};
use synheart_progress::session::TrackerSession;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Activity at noon UTC `days_ago` days before 2024-06-12.
fn activity(days_ago: i64, minutes: u32) -> Activity {
    let noon = Utc.with_ymd_and_hms(2024, 6, 12, 12, 0, 0).unwrap() - Duration::days(days_ago);
    Activity::new(RecordMeta::new("patient-1", noon).unwrap(), 1000, minutes, 80, "walk").unwrap()
}

fn store_of(records: Vec<Activity>) -> RecordStore<Activity> {
    let mut store = RecordStore::new();
    for record in records {
        store.append(record).unwrap();
    }
    store
}

#[test]
fn test_ranges_are_well_formed_for_a_whole_year() {
    let mut day = date(2023, 12, 25);
    while day <= date(2025, 1, 5) {
        for mode in [RangeMode::Today, RangeMode::Week, RangeMode::Month] {
            let range = range_for(mode, day);
            assert!(range.start <= range.end);
            assert!(range.contains(day));
        }

        let week = range_for(RangeMode::Week, day);
        assert_eq!(week.start.weekday(), Weekday::Mon);
        assert_eq!(week.end.weekday(), Weekday::Sun);
        assert_eq!(week.day_count(), 7);

        let month = range_for(RangeMode::Month, day);
        assert_eq!(month.start.day(), 1);
        assert_ne!(month.end.succ_opt().unwrap().month(), day.month());

        day = day.succ_opt().unwrap();
    }
}

#[test]
fn test_february_month_ends() {
    assert_eq!(range_for(RangeMode::Month, date(2024, 2, 10)).end, date(2024, 2, 29));
    assert_eq!(range_for(RangeMode::Month, date(2023, 2, 10)).end, date(2023, 2, 28));
}

#[test]
fn test_aggregate_ignores_insertion_order() {
    let records = vec![activity(0, 30), activity(1, 45), activity(9, 60)];
    let mut reversed = records.clone();
    reversed.reverse();

    let week = range_for(RangeMode::Week, date(2024, 6, 12));
    let forward = aggregate(&store_of(records), &week);
    let backward = aggregate(&store_of(reversed), &week);

    assert_eq!(forward, backward);
    assert_eq!(forward.total(Metric::ActiveMinutes), 75.0);
    assert_eq!(forward.record_count, 2);
}

#[test]
fn test_empty_store_totals_are_zero() {
    let result = aggregate(&RecordStore::<Activity>::new(), &TimeRange::single_day(date(2024, 6, 12)));
    assert_eq!(result.record_count, 0);
    assert!(result.totals.values().all(|total| *total == 0.0));
    assert_eq!(result.totals.len(), 3);
}

#[test]
fn test_individual_records_are_judged_alone() {
    let store = store_of(vec![
        activity(2, 40),
        activity(1, 20),
        activity(1, 10),
        activity(0, 55),
    ]);
    assert_eq!(streak(&store, 60), 0);
}

#[test]
fn test_single_qualifying_day() {
    assert_eq!(streak(&store_of(vec![activity(0, 70)]), 60), 1);
}

#[test]
fn test_same_day_records_do_not_extend() {
    assert_eq!(streak(&store_of(vec![activity(0, 70), activity(0, 70)]), 60), 1);
}

#[test]
fn test_stale_streak_needs_recency_check() {
    let store = store_of(vec![activity(10, 90), activity(11, 90), activity(12, 90)]);
    assert_eq!(streak(&store, 60), 3);
    assert_eq!(streak_as_of(&store, 60, date(2024, 6, 12)), 0);
    assert_eq!(streak_as_of(&store, 60, date(2024, 6, 3)), 3);
}

#[test]
fn test_advice_tiers() {
    assert_eq!(advise(0, 60), Advice::NotStarted);
    assert_eq!(advise(30, 60), Advice::InProgress { remaining: 30 });
    assert_eq!(advise(60, 60), Advice::GoalReached);
    assert_eq!(advise(90, 60), Advice::GoalReached);
}

#[test]
fn test_deleted_record_leaves_ranges() {
    let mut store = store_of(vec![activity(0, 30), activity(1, 30)]);
    let doomed = store.records()[0].id();
    store.delete(doomed).unwrap();

    let week = range_for(RangeMode::Week, date(2024, 6, 12));
    assert!(store.records_in_range(&week).iter().all(|r| r.id() != doomed));
}

#[test]
fn test_missing_update_leaves_store_unchanged() {
    let mut store = store_of(vec![activity(0, 30)]);
    let before = store.records().to_vec();

    assert!(store.update(uuid::Uuid::new_v4(), |a| a.active_minutes = 999).is_err());
    assert_eq!(store.records(), before.as_slice());
}

#[tokio::test]
async fn test_session_snapshot_uses_local_days() {
    let tz: chrono_tz::Tz = "America/New_York".parse().unwrap();
    let mut session = TrackerSession::new("patient-1", tz, Arc::new(MemoryProvider::new()));

    // 02:00 UTC on June 12 is still June 11 in New York.
    let late_evening = Utc.with_ymd_and_hms(2024, 6, 12, 2, 0, 0).unwrap();
    session
        .append(
            Activity::new(RecordMeta::new("patient-1", late_evening).unwrap(), 0, 65, 0, "swim")
                .unwrap(),
        )
        .await
        .unwrap();

    let builder = ProgressBuilder::default();
    let june_11 = builder.build(&session, RangeMode::Today, date(2024, 6, 11));
    let june_12 = builder.build(&session, RangeMode::Today, date(2024, 6, 12));

    assert_eq!(june_11.today.active_minutes, 65);
    assert_eq!(june_11.advice, Advice::GoalReached);
    assert_eq!(june_12.today.active_minutes, 0);
    assert_eq!(june_12.advice, Advice::NotStarted);
    assert_eq!(june_12.streak.current, 1);
}
