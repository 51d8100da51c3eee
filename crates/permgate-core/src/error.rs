//! Error types for `permgate`.

use thiserror::Error;

/// Result type alias using `permgate` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `permgate` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A request or combinator was invoked without any capability names.
    #[error("at least one capability name is required")]
    NoCapabilities,

    /// A combined permission was built from zero records.
    #[error("cannot combine an empty list of permissions")]
    EmptyCombination,

    /// The host reported a different number of results than names.
    #[error("prompt result mismatch: {names} names but {results} results")]
    ResultLengthMismatch { names: usize, results: usize },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
