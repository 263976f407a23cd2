//! Error types for the Windgate library.

use thiserror::Error;

/// Main error type for Windgate operations.
#[derive(Error, Debug)]
pub enum WindgateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Windgate operations.
pub type Result<T> = std::result::Result<T, WindgateError>;
