//! Review items and their scheduling state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{BoxId, ItemId};

/// Level every new item starts at.
pub const INITIAL_LEVEL: i32 = 1;

/// A two-sided review card living in a box.
///
/// `level` and `show_date` are only ever written by the level scheduler (and by
/// item creation, which starts at [`INITIAL_LEVEL`] and is due immediately).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub box_id: BoxId,
    pub text1: String,
    pub text2: String,
    pub level: i32,
    pub show_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Whether the item is eligible for review at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.show_date <= now
    }
}

/// Fields required to persist a new item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub box_id: BoxId,
    pub text1: String,
    pub text2: String,
    pub level: i32,
    pub show_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Validated text changes; `None` leaves a side untouched.
#[derive(Debug, Clone, Default)]
pub struct ItemTextChanges {
    pub text1: Option<String>,
    pub text2: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Compare-and-set request for an item's schedule.
///
/// Applied only if the stored level still equals `expected_level`.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleUpdate {
    pub expected_level: i32,
    pub level: i32,
    pub show_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter for item listings. Items are always scoped to the owner's boxes.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub box_id: Option<BoxId>,
    /// Only items with `show_date <= due_at`.
    pub due_at: Option<DateTime<Utc>>,
}

/// Item create payload as received from the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemDraft {
    pub box_id: Option<i64>,
    pub text1: Option<String>,
    pub text2: Option<String>,
}

/// Item update payload; both sides optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemUpdateDraft {
    pub text1: Option<String>,
    pub text2: Option<String>,
}

/// Review payload. Kept loose so that `1`, `"0"` and friends can be accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewDraft {
    pub is_true: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn item_due_at(show_date: DateTime<Utc>) -> Item {
        Item {
            id: ItemId(1),
            box_id: BoxId(1),
            text1: "hola".to_string(),
            text2: "hello".to_string(),
            level: INITIAL_LEVEL,
            show_date,
            created_at: show_date,
            updated_at: show_date,
        }
    }

    #[test]
    fn test_item_is_due_on_and_after_show_date() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let item = item_due_at(at);
        assert!(!item.is_due(at - Duration::seconds(1)));
        assert!(item.is_due(at));
        assert!(item.is_due(at + Duration::days(1)));
    }

    #[test]
    fn test_item_serializes_ids_and_dates_flat() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_value(item_due_at(at)).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["box_id"], 1);
        assert_eq!(json["level"], 1);
        assert_eq!(json["show_date"], "2024-03-01T12:00:00Z");
    }
}
