use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{api_tokens, boxes, items, posts, users};
use crate::api::{BoxId, ItemId, PostId, TokenId, UserId};
use crate::models::{ApiToken, CardBox, Item, Post, User};

// ==================== Users ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId(row.id),
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

// ==================== Tokens ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = api_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ApiTokenRow {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = api_tokens)]
pub struct NewApiTokenRow {
    pub user_id: i64,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<ApiTokenRow> for ApiToken {
    fn from(row: ApiTokenRow) -> Self {
        Self {
            id: TokenId(row.id),
            user_id: UserId(row.user_id),
            token_hash: row.token_hash,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
        }
    }
}

// ==================== Boxes ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = boxes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BoxRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = boxes)]
pub struct NewBoxRow {
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = boxes)]
pub struct BoxChangeset {
    pub title: String,
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

impl From<BoxRow> for CardBox {
    fn from(row: BoxRow) -> Self {
        Self {
            id: BoxId(row.id),
            user_id: UserId(row.user_id),
            title: row.title,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ==================== Items ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ItemRow {
    pub id: i64,
    pub box_id: i64,
    pub text1: String,
    pub text2: String,
    pub level: i32,
    pub show_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = items)]
pub struct NewItemRow {
    pub box_id: i64,
    pub text1: String,
    pub text2: String,
    pub level: i32,
    pub show_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `None` fields are left out of the UPDATE.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = items)]
pub struct ItemTextChangeset {
    pub text1: Option<String>,
    pub text2: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: ItemId(row.id),
            box_id: BoxId(row.box_id),
            text1: row.text1,
            text2: row.text2,
            level: row.level,
            show_date: row.show_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ==================== Posts ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPostRow {
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = posts)]
pub struct PostChangeset {
    pub title: String,
    pub body: String,
    pub updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: PostId(row.id),
            user_id: UserId(row.user_id),
            title: row.title,
            body: row.body,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
