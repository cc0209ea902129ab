//! # Recall Backend
//!
//! REST backend for a spaced-repetition study app.
//!
//! Users keep boxes of two-sided review items. Every item sits on a numbered level;
//! answering it correctly promotes it and pushes its next showing further out, while
//! a wrong answer sends it back to level 1. A small blog (posts) rides along.
//!
//! ## Architecture
//!
//! - [`scheduler`]: the level rule table and the pure `compute_next` transition
//! - [`models`]: records, drafts, pagination and time sources
//! - [`db`]: repository traits, the in-memory and Postgres backends, backend selection
//! - [`services`]: validation, ownership checks and orchestration
//! - [`auth`]: password hashing and bearer-token digests
//! - [`config`]: server settings from the environment
//! - [`http`]: axum router, handlers and extractors
//! - [`api`]: identifier newtypes and the public record types

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod models;
pub mod scheduler;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
