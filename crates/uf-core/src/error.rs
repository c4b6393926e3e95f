//! Error types for unfolding comparisons

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unfolded values, truth and covariance disagree in dimension
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Covariance matrix cannot be inverted
    #[error("singular covariance: {0}")]
    SingularCovariance(String),

    /// A method is present in one keyed container but absent from another
    #[error("method '{method}' has no entry in {container}")]
    MissingMethodKey {
        /// Method label (e.g. "IBU4")
        method: String,
        /// Name of the container that lacks the key
        container: String,
    },

    /// Method label is not part of the method style table
    #[error("unknown unfolding method: {0}")]
    UnknownMethod(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
