//! Blog posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{PostId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub user_id: UserId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Only the author may modify a post.
    pub fn can_be_modified_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: UserId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub body: String,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload as received from the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostDraft {
    pub title: Option<String>,
    pub body: Option<String>,
}
