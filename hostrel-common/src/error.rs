//! Common error types for hostrel

use thiserror::Error;

/// Common result type for hostrel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the feature pass and the labeling session
#[derive(Error, Debug)]
pub enum Error {
    /// Backing store cannot be reached (connection, pool or I/O failure)
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Any other database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Host already has a label record; the ledger never relabels
    #[error("Host already labeled: {0}")]
    DuplicateLabel(String),

    /// Annotator input outside the valid relevance code set
    #[error("Invalid relevance code: {0:?} (expected 1, 2 or 3)")]
    InvalidRelevanceCode(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the whole run must stop rather than move on to the next host
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_) | Error::Io(_) | Error::Config(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Error::StoreUnavailable(err.to_string()),
            other => Error::Database(other),
        }
    }
}
