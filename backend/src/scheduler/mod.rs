//! Level-based review scheduling.
//!
//! Every item sits on a numbered level. A review moves it along a fixed rule table:
//! a correct answer promotes it (the top levels loop onto themselves) and an incorrect
//! answer sends it back to level 1. Each transition also pushes the item's show date
//! forward by the interval attached to that edge.
//!
//! ```text
//!   correct:    1 ──► 2 ──► 3 ──► 4 ──► 5 ◄─┐      6 ◄─┐
//!                                       └───┘      └───┘
//!   incorrect:  any level ──► 1
//! ```
//!
//! The scheduler is a pure function over its inputs and the static [`RULES`] table;
//! persisting the result is the caller's job.

mod interval;

pub use interval::{Interval, IntervalUnit};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happens to an item on a given level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelRule {
    pub level: i32,
    pub next_on_correct: i32,
    pub correct_interval: Interval,
    pub next_on_incorrect: i32,
    pub incorrect_interval: Interval,
}

impl LevelRule {
    /// A rule whose incorrect branch resets to level 1 after one day.
    pub const fn new(level: i32, next_on_correct: i32, correct_interval: Interval) -> Self {
        Self {
            level,
            next_on_correct,
            correct_interval,
            next_on_incorrect: 1,
            incorrect_interval: Interval::days(1),
        }
    }

    /// Target level and interval for the given outcome.
    pub fn branch(&self, is_correct: bool) -> (i32, Interval) {
        if is_correct {
            (self.next_on_correct, self.correct_interval)
        } else {
            (self.next_on_incorrect, self.incorrect_interval)
        }
    }
}

/// The level table. Levels 5 and 6 are ceilings.
pub static RULES: [LevelRule; 6] = [
    LevelRule::new(1, 2, Interval::days(3)),
    LevelRule::new(2, 3, Interval::weeks(1)),
    LevelRule::new(3, 4, Interval::weeks(2)),
    LevelRule::new(4, 5, Interval::months(1)),
    LevelRule::new(5, 5, Interval::months(1)),
    LevelRule::new(6, 6, Interval::months(1)),
];

/// Scheduling failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// The item's current level has no rule.
    #[error("Invalid current level")]
    InvalidLevel(i32),

    /// Adding the interval left the representable date range.
    #[error("show date out of range: {interval} after {from}")]
    DateOutOfRange {
        from: DateTime<Utc>,
        interval: Interval,
    },
}

/// New scheduling state for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextReview {
    pub level: i32,
    pub show_date: DateTime<Utc>,
}

/// Applies a rule table to review outcomes.
#[derive(Debug, Clone, Copy)]
pub struct LevelScheduler {
    rules: &'static [LevelRule],
}

impl LevelScheduler {
    /// Scheduler over the standard [`RULES`] table.
    pub const fn standard() -> Self {
        Self { rules: &RULES }
    }

    /// Scheduler over a custom table.
    pub const fn with_rules(rules: &'static [LevelRule]) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'static [LevelRule] {
        self.rules
    }

    /// Rule for `level`, if the table has one.
    pub fn rule_for(&self, level: i32) -> Option<&'static LevelRule> {
        self.rules.iter().find(|rule| rule.level == level)
    }

    /// Whether `level` is a key in the table.
    pub fn is_valid_level(&self, level: i32) -> bool {
        self.rule_for(level).is_some()
    }

    /// Compute the level and show date that follow a review.
    ///
    /// Unknown levels are rejected rather than clamped.
    pub fn compute_next(
        &self,
        current_level: i32,
        is_correct: bool,
        now: DateTime<Utc>,
    ) -> Result<NextReview, SchedulerError> {
        let rule = self
            .rule_for(current_level)
            .ok_or(SchedulerError::InvalidLevel(current_level))?;

        let (level, interval) = rule.branch(is_correct);
        let show_date = interval
            .after(now)
            .ok_or(SchedulerError::DateOutOfRange {
                from: now,
                interval,
            })?;

        Ok(NextReview { level, show_date })
    }
}

impl Default for LevelScheduler {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests;
