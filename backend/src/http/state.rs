//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::repository::FullRepository;
use crate::models::{Clock, PageRequest, SystemClock};
use crate::scheduler::LevelScheduler;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    pub scheduler: LevelScheduler,
    pub clock: Arc<dyn Clock>,
    pub config: ServerConfig,
}

impl AppState {
    /// State with the wall clock, the standard rule table and default settings.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self::with_config(repository, ServerConfig::default())
    }

    pub fn with_config(repository: Arc<dyn FullRepository>, config: ServerConfig) -> Self {
        Self {
            repository,
            scheduler: LevelScheduler::standard(),
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the time source. Tests pin time with a `FixedClock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Page request for a listing, filling in the configured page size.
    pub fn page(&self, page: Option<u32>, per_page: Option<u32>) -> PageRequest {
        PageRequest::new(
            page.unwrap_or(1),
            per_page.unwrap_or(self.config.page_size),
        )
    }
}
