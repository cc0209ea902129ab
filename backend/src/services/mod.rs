//! Service layer: validation, ownership checks and orchestration.
//!
//! Services sit between the HTTP handlers and the repository traits. Every function is
//! generic over the repository (`R: FullRepository + ?Sized`), so the same code runs
//! against the in-memory store in tests and against Postgres in production.
//!
//! Checks run in a fixed order per operation (for example: validate, then 404, then
//! 403 on create; 404, then 403, then validate on box update). Handlers rely on that
//! order to pick the status code.

pub mod auth;
pub mod boxes;
pub mod items;
pub mod posts;
pub mod validation;

pub use validation::FieldErrors;

#[cfg(test)]
pub(crate) mod test_support;

use crate::auth::PasswordError;
use crate::db::repository::RepositoryError;
use crate::scheduler::SchedulerError;

/// Errors surfaced by services, one variant per HTTP outcome.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    /// One or more fields failed validation.
    #[error("{message}")]
    Validation {
        message: String,
        errors: FieldErrors,
    },

    /// The item's stored level has no scheduling rule. Nothing was written.
    #[error("Invalid current level")]
    InvalidLevel(i32),

    /// A concurrent write won the race and retries ran out.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn validation(message: impl Into<String>, errors: FieldErrors) -> Self {
        Self::Validation {
            message: message.into(),
            errors,
        }
    }
}

impl From<SchedulerError> for ServiceError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::InvalidLevel(level) => Self::InvalidLevel(level),
            other @ SchedulerError::DateOutOfRange { .. } => Self::Internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Fail with `message` if any field failed.
pub(crate) fn ensure_valid(errors: FieldErrors, message: &str) -> ServiceResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::validation(message, errors))
    }
}

/// Turn a repository not-found into a service not-found with a client-facing message.
pub(crate) fn not_found_as(message: &'static str) -> impl Fn(RepositoryError) -> ServiceError {
    move |err| {
        if err.is_not_found() {
            ServiceError::NotFound(message.to_string())
        } else {
            ServiceError::Repository(err)
        }
    }
}
