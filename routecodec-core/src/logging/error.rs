//! Error types for the logging subsystem

use thiserror::Error;

/// Errors that can occur in the logging subsystem
#[derive(Debug, Clone, Error)]
pub enum LoggingError {
    /// A global subscriber is already installed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// Invalid configuration provided
    #[error("Invalid logging configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_error_display() {
        let err = LoggingError::InitializationFailed("already set".to_string());
        assert_eq!(err.to_string(), "Failed to initialize logging: already set");

        let err = LoggingError::InvalidConfiguration("unknown level 'loud'".to_string());
        assert_eq!(err.to_string(), "Invalid logging configuration: unknown level 'loud'");
    }
}
