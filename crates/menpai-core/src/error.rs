//! Error types for the menpai query engine.

use thiserror::Error;

/// Result type alias using menpai's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for address query operations.
///
/// The taxonomy separates caller faults (`Validation`), semantic misses
/// (`NotFound`), and store faults (`Database`). Store faults are surfaced
/// as-is and never retried; the spatial-to-haversine fallback inside the
/// distance evaluator is the single place an error is swallowed.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Hierarchy key resolved to zero rows
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or out-of-range input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True if this error is the caller's fault (maps to HTTP 400 upstream).
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// True if this is a semantic miss rather than a store fault
    /// (maps to HTTP 404 upstream).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
