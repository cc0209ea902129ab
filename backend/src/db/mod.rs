//! Persistence for users, boxes, items and posts.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers (axum)                                   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Services - validation, ownership, scheduling           │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository/) - abstract interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!          ┌──────────┴───────────┐
//!          ▼                      ▼
//!   LocalRepository        PostgresRepository
//!     (in-memory)          (diesel + r2d2)
//! ```
//!
//! - `repository`: trait definitions and errors
//! - `repositories::local`: in-memory implementation (default)
//! - `repositories::postgres`: Postgres implementation (feature `postgres-repo`)
//! - `factory`: backend selection from code, environment or `repository.toml`

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    BoxRepository, ErrorContext, FullRepository, ItemRepository, PostRepository,
    RepositoryError, RepositoryResult, UserRepository,
};

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Initialize the global repository from the environment.
///
/// `repository.toml` in a standard location takes precedence over `REPOSITORY_TYPE`
/// and `DATABASE_URL`. Calling this again after a successful init is a no-op.
pub async fn init_repository() -> Result<&'static Arc<dyn FullRepository>> {
    if let Some(repo) = REPOSITORY.get() {
        return Ok(repo);
    }

    let repo = build_repository(RepositoryConfig::find_default_path().as_deref()).await?;

    // A concurrent init may have won; either instance is equivalent.
    let _ = REPOSITORY.set(repo);
    get_repository()
}

/// Build a repository from `config_path`, or from the environment when there is none.
///
/// A config file that is present but unreadable or malformed fails the build instead
/// of falling back to the environment.
pub async fn build_repository(config_path: Option<&Path>) -> Result<Arc<dyn FullRepository>> {
    let Some(path) = config_path else {
        return Ok(RepositoryFactory::from_env().await?);
    };

    log::info!("Using repository settings from {}", path.display());
    let config = RepositoryConfig::from_file(path)
        .with_context(|| format!("Invalid repository config at {}", path.display()))?;
    let repo = RepositoryBuilder::new()
        .with_config(&config)
        .with_context(|| format!("Invalid repository config at {}", path.display()))?
        .build()
        .await?;
    Ok(repo)
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    REPOSITORY
        .get()
        .context("Database not initialized. Call init_repository() first.")
}
