//! Engine service error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors returned by the engine services.
///
/// Reads of aggregates never fail on missing data; these variants cover
/// unknown entities, authorization, invariants and input validation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Referenced entity doesn't exist.
    #[error("{0}")]
    NotFound(String),

    /// Caller's role or ownership doesn't permit the operation.
    #[error("{0}")]
    Forbidden(String),

    /// Operation would violate an invariant (duplicate pair, wrong status).
    #[error("{0}")]
    Conflict(String),

    /// Input failed validation. Nothing was written.
    #[error("{0}")]
    Validation(String),

    /// Storage failure.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub(crate) fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    pub(crate) fn forbidden() -> Self {
        Self::Forbidden("Access denied".to_owned())
    }

    /// Map a repository error from a write, naming the missing entity.
    pub(crate) fn from_write(e: RepositoryError, missing: &str) -> Self {
        match e {
            RepositoryError::NotFound => Self::not_found(missing),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Repository(other),
        }
    }
}
