//! Error types for chute.

use thiserror::Error;

/// Common error type for chute.
#[derive(Error, Debug)]
pub enum ChuteError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Resource existed but its lifetime has run out.
    #[error("{0} has expired")]
    Expired(String),

    /// Validation error for client input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// No free share code could be generated.
    ///
    /// Raised after the registry runs out of collision retries, which only
    /// happens when the live-code population is a large fraction of the
    /// code space.
    #[error("share code space exhausted")]
    CodesExhausted,

    /// The registry refused a new group because the configured live-group
    /// limit has been reached.
    #[error("transfer store at capacity")]
    AtCapacity,
}

/// Result type alias for chute operations.
pub type Result<T> = std::result::Result<T, ChuteError>;
