//! # Sift Common
//!
//! Shared setup for the sift crates and tools. The tokenizer itself only emits
//! `tracing` events; binaries call [`init_logging`] to decide where they go.

use thiserror::Error;

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat};

/// Errors raised by the shared setup code.
#[derive(Error, Debug)]
pub enum CommonError {
    /// Logging could not be configured or installed.
    #[error("Logging error: {0}")]
    Logging(String),
}

/// Result type alias for shared setup code.
pub type Result<T> = std::result::Result<T, CommonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CommonError::Logging("already installed".into());
        assert_eq!(err.to_string(), "Logging error: already installed");
    }
}
