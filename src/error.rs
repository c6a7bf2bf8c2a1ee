//! Error types for the R-DSOM network.

use thiserror::Error;

/// The main error type for R-DSOM operations.
#[derive(Error, Debug)]
pub enum RdsomError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Topology could not be built with the requested parameters.
    #[error("Topology error: {0}")]
    Topology(String),

    /// Malformed or inconsistent persisted network document.
    #[error("Invalid network document: {0}")]
    Document(String),

    /// An operation was called out of order.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Vector dimension does not match the network.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// The dimension the network expects.
        expected: usize,
        /// The dimension that was supplied.
        found: usize,
    },

    /// Input vector with NaN or infinite components.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Index out of bounds.
    #[error("Index out of bounds: {index} >= {max}")]
    IndexOutOfBounds {
        /// The index that was out of bounds.
        index: usize,
        /// The maximum allowed index.
        max: usize,
    },

    /// Training error.
    #[error("Training error: {0}")]
    Training(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for R-DSOM operations.
pub type Result<T> = std::result::Result<T, RdsomError>;

impl From<serde_json::Error> for RdsomError {
    fn from(err: serde_json::Error) -> Self {
        RdsomError::Serialization(err.to_string())
    }
}
