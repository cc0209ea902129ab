//! Fixtures shared by the service tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::api::BoxId;
use crate::db::repositories::LocalRepository;
use crate::db::repository::{BoxRepository, UserRepository};
use crate::models::{CardBox, FixedClock, NewCardBox, NewUser, User};

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 31, 8, 0, 0).unwrap()
}

/// An in-memory store with two users and a pinned clock.
pub struct Fixture {
    pub repo: LocalRepository,
    pub clock: FixedClock,
    pub ada: User,
    pub bob: User,
}

impl Fixture {
    pub async fn new() -> Self {
        let repo = LocalRepository::new();
        let clock = FixedClock::new(start());
        let ada = Self::user(&repo, "Ada", "ada@example.com").await;
        let bob = Self::user(&repo, "Bob", "bob@example.com").await;
        Self {
            repo,
            clock,
            ada,
            bob,
        }
    }

    async fn user(repo: &LocalRepository, name: &str, email: &str) -> User {
        repo.create_user(&NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            created_at: start(),
        })
        .await
        .unwrap()
    }

    pub async fn box_for(&self, owner: &User, title: &str) -> CardBox {
        self.repo
            .create_box(&NewCardBox {
                user_id: owner.id,
                title: title.to_string(),
                description: format!("{title} words"),
                created_at: start(),
            })
            .await
            .unwrap()
    }

    pub async fn box_id_for(&self, owner: &User) -> BoxId {
        self.box_for(owner, "Spanish").await.id
    }
}
