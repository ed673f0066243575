//! Error types for engine commands and the persistence boundary.

use thiserror::Error;

/// Errors returned by engine commands.
///
/// Every failure leaves the engine unmutated; callers may retry or ignore.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("no open bet at index {index}")]
    NotFound { index: usize },

    #[error("bet amount must be positive")]
    InvalidAmount,

    #[error("persistence failed: {0}")]
    Persistence(String),
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
