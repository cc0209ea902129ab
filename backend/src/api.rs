//! Public API surface for the Rust backend.
//!
//! This file consolidates the identifier newtypes and the record types exchanged over
//! the HTTP API. All types derive Serialize/Deserialize for JSON serialization.

pub use crate::models::{
    CardBox, CardBoxDraft, CardBoxWithItems, IssuedToken, Item, ItemDraft, ItemUpdateDraft,
    LoginDraft, Page, PageRequest, Post, PostDraft, RegisterDraft, ReviewDraft, User,
};
pub use crate::scheduler::{IntervalUnit, LevelScheduler, NextReview, SchedulerError};

use crate::define_id_type;

define_id_type!(i64, UserId);
define_id_type!(i64, TokenId);
define_id_type!(i64, BoxId);
define_id_type!(i64, ItemId);
define_id_type!(i64, PostId);
