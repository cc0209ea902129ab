//! Calendar intervals.

use std::fmt;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Days,
    Weeks,
    Months,
}

/// A magnitude in days, weeks or calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub unit: IntervalUnit,
    pub amount: u32,
}

impl Interval {
    pub const fn days(amount: u32) -> Self {
        Self {
            unit: IntervalUnit::Days,
            amount,
        }
    }

    pub const fn weeks(amount: u32) -> Self {
        Self {
            unit: IntervalUnit::Weeks,
            amount,
        }
    }

    pub const fn months(amount: u32) -> Self {
        Self {
            unit: IntervalUnit::Months,
            amount,
        }
    }

    /// `from` pushed forward by this interval, or `None` on overflow.
    ///
    /// Months follow calendar arithmetic and clamp to the last day of the target
    /// month: Jan 31 + 1 month is Feb 28 (Feb 29 in leap years). Time of day is kept.
    pub fn after(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.unit {
            IntervalUnit::Days => from.checked_add_signed(Duration::days(i64::from(self.amount))),
            IntervalUnit::Weeks => {
                from.checked_add_signed(Duration::weeks(i64::from(self.amount)))
            }
            IntervalUnit::Months => from.checked_add_months(Months::new(self.amount)),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match (self.unit, self.amount) {
            (IntervalUnit::Days, 1) => "day",
            (IntervalUnit::Days, _) => "days",
            (IntervalUnit::Weeks, 1) => "week",
            (IntervalUnit::Weeks, _) => "weeks",
            (IntervalUnit::Months, 1) => "month",
            (IntervalUnit::Months, _) => "months",
        };
        write!(f, "+{} {}", self.amount, unit)
    }
}
