//! Repository implementations.
//!
//! - `local`: in-memory implementation for tests and local development (default)
//! - `postgres`: PostgreSQL implementation with Diesel ORM (feature `postgres-repo`)
pub mod local;
#[cfg(feature = "postgres-repo")]
pub mod postgres;

pub use local::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use postgres::{PoolStats, PostgresConfig, PostgresRepository};
