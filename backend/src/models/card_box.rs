//! Boxes: per-user containers of review items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::Item;
use crate::api::{BoxId, UserId};

/// A box owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardBox {
    pub id: BoxId,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CardBox {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

/// Fields required to persist a new box.
#[derive(Debug, Clone)]
pub struct NewCardBox {
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Validated replacement values for a box.
#[derive(Debug, Clone)]
pub struct CardBoxChanges {
    pub title: String,
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload as received from the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardBoxDraft {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// A box with its items, as returned by the show endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CardBoxWithItems {
    #[serde(flatten)]
    pub card_box: CardBox,
    pub items: Vec<Item>,
}
