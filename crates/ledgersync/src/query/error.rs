use thiserror::Error;

use ledgersync_core::cache::CacheError;
use ledgersync_core::storage::{PeriodError, RepositoryError};

/// Errors returned by the typed ledger queries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Period(#[from] PeriodError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Result type for typed queries.
pub type Result<T> = std::result::Result<T, QueryError>;
