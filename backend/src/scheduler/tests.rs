//! Tests for the level scheduler.
//!
//! These pin the rule table down edge by edge and check the calendar behavior of
//! month intervals across month ends.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use super::*;

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 8, 15, 0).unwrap()
}

fn next(level: i32, is_correct: bool, now: DateTime<Utc>) -> NextReview {
    LevelScheduler::standard()
        .compute_next(level, is_correct, now)
        .unwrap()
}

// =========================================================
// Rule table edges
// =========================================================

#[test]
fn test_level_one_incorrect_stays_and_waits_a_day() {
    let now = at(2024, 5, 10);
    let result = next(1, false, now);
    assert_eq!(result.level, 1);
    assert_eq!(result.show_date, now + Duration::days(1));
}

#[test]
fn test_level_one_correct_promotes_and_waits_three_days() {
    let now = at(2024, 5, 10);
    let result = next(1, true, now);
    assert_eq!(result.level, 2);
    assert_eq!(result.show_date, now + Duration::days(3));
}

#[test]
fn test_level_two_correct_waits_a_week() {
    let now = at(2024, 5, 10);
    let result = next(2, true, now);
    assert_eq!(result.level, 3);
    assert_eq!(result.show_date, now + Duration::weeks(1));
}

#[test]
fn test_level_three_correct_waits_two_weeks() {
    let now = at(2024, 5, 10);
    let result = next(3, true, now);
    assert_eq!(result.level, 4);
    assert_eq!(result.show_date, now + Duration::weeks(2));
}

#[test]
fn test_level_four_correct_waits_a_calendar_month() {
    let now = at(2024, 5, 10);
    let result = next(4, true, now);
    assert_eq!(result.level, 5);
    assert_eq!(result.show_date, at(2024, 6, 10));
}

#[test]
fn test_level_three_incorrect_resets_to_one() {
    let now = at(2024, 5, 10);
    let result = next(3, false, now);
    assert_eq!(result.level, 1);
    assert_eq!(result.show_date, now + Duration::days(1));
}

#[test]
fn test_level_five_is_a_ceiling() {
    let now = at(2024, 5, 10);
    let result = next(5, true, now);
    assert_eq!(result.level, 5);
    assert_eq!(result.show_date, at(2024, 6, 10));

    // Re-answering keeps pushing the due date forward.
    let again = next(result.level, true, result.show_date);
    assert_eq!(again.level, 5);
    assert_eq!(again.show_date, at(2024, 7, 10));
}

#[test]
fn test_level_six_is_a_ceiling() {
    let now = at(2024, 5, 10);
    let result = next(6, true, now);
    assert_eq!(result.level, 6);
    assert_eq!(result.show_date, at(2024, 6, 10));
}

#[test]
fn test_every_incorrect_answer_resets_to_one() {
    let now = at(2024, 5, 10);
    for rule in RULES.iter() {
        let result = next(rule.level, false, now);
        assert_eq!(result.level, 1, "level {}", rule.level);
        assert_eq!(result.show_date, now + Duration::days(1));
    }
}

#[test]
fn test_unknown_levels_are_rejected() {
    let scheduler = LevelScheduler::standard();
    let now = at(2024, 5, 10);
    for level in [99, 0, -1, 7] {
        let err = scheduler.compute_next(level, true, now).unwrap_err();
        assert_eq!(err, SchedulerError::InvalidLevel(level));
        assert_eq!(err.to_string(), "Invalid current level");
    }
}

#[test]
fn test_rule_lookup() {
    let scheduler = LevelScheduler::default();
    assert!(scheduler.is_valid_level(1));
    assert!(scheduler.is_valid_level(6));
    assert!(!scheduler.is_valid_level(7));
    assert_eq!(scheduler.rules().len(), 6);
    assert_eq!(
        scheduler.rule_for(2).map(|r| r.correct_interval),
        Some(Interval::weeks(1))
    );
}

#[test]
fn test_custom_table_without_level_six() {
    static FIVE_LEVELS: [LevelRule; 5] = [
        LevelRule::new(1, 2, Interval::days(3)),
        LevelRule::new(2, 3, Interval::weeks(1)),
        LevelRule::new(3, 4, Interval::weeks(2)),
        LevelRule::new(4, 5, Interval::months(1)),
        LevelRule::new(5, 5, Interval::months(1)),
    ];
    let scheduler = LevelScheduler::with_rules(&FIVE_LEVELS);
    assert!(matches!(
        scheduler.compute_next(6, true, at(2024, 1, 1)),
        Err(SchedulerError::InvalidLevel(6))
    ));
}

// =========================================================
// Calendar arithmetic
// =========================================================

#[test]
fn test_month_end_clamps_in_common_year() {
    let now = at(2023, 1, 31);
    let result = next(4, true, now);
    assert_eq!(result.show_date, at(2023, 2, 28));
}

#[test]
fn test_month_end_clamps_in_leap_year() {
    let now = at(2024, 1, 31);
    let result = next(5, true, now);
    assert_eq!(result.show_date, at(2024, 2, 29));
}

#[test]
fn test_month_addition_rolls_over_the_year() {
    let now = at(2024, 12, 15);
    let result = next(4, true, now);
    assert_eq!(result.show_date, at(2025, 1, 15));
}

#[test]
fn test_day_intervals_cross_month_boundaries() {
    let now = at(2024, 2, 28);
    let result = next(1, true, now);
    assert_eq!(result.show_date, at(2024, 3, 2));
}

#[test]
fn test_overflow_is_reported_not_panicked() {
    let err = LevelScheduler::standard()
        .compute_next(4, true, DateTime::<Utc>::MAX_UTC)
        .unwrap_err();
    assert!(matches!(err, SchedulerError::DateOutOfRange { .. }));
}

#[test]
fn test_interval_display() {
    assert_eq!(Interval::days(1).to_string(), "+1 day");
    assert_eq!(Interval::days(3).to_string(), "+3 days");
    assert_eq!(Interval::weeks(2).to_string(), "+2 weeks");
    assert_eq!(Interval::months(1).to_string(), "+1 month");
}

// =========================================================
// Properties
// =========================================================

fn any_instant() -> impl Strategy<Value = DateTime<Utc>> {
    // 2000-01-01 .. 2100-01-01
    (946_684_800i64..4_102_444_800i64)
        .prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap())
}

proptest! {
    #[test]
    fn prop_next_level_is_always_in_the_table(
        level in 1i32..=6,
        is_correct in any::<bool>(),
        now in any_instant(),
    ) {
        let scheduler = LevelScheduler::standard();
        let result = scheduler.compute_next(level, is_correct, now).unwrap();
        prop_assert!(scheduler.is_valid_level(result.level));
    }

    #[test]
    fn prop_show_date_moves_forward(
        level in 1i32..=6,
        is_correct in any::<bool>(),
        now in any_instant(),
    ) {
        let result = LevelScheduler::standard().compute_next(level, is_correct, now).unwrap();
        prop_assert!(result.show_date > now);
        prop_assert!(result.show_date <= now + Duration::days(31));
    }

    #[test]
    fn prop_levels_outside_the_table_fail(level in any::<i32>(), now in any_instant()) {
        prop_assume!(!(1..=6).contains(&level));
        let result = LevelScheduler::standard().compute_next(level, true, now);
        prop_assert_eq!(result, Err(SchedulerError::InvalidLevel(level)));
    }
}
