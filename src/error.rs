use thiserror::Error;

/// Main error type for Relgraph
#[derive(Error, Debug)]
pub enum RelgraphError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Relation API failures (network, timeout, non-2xx, non-JSON).
    /// Recovered locally as "zero relationships"; never returned to query callers.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Checkpoint encode/decode or storage errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using RelgraphError
pub type Result<T> = std::result::Result<T, RelgraphError>;
