//! Configuration errors
//!
//! File faults carry the config file path; value faults carry the dotted
//! key (`codec.inbound_schema`) or the environment variable that held it.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {reason}", .path.display())]
    Read { path: PathBuf, reason: String },

    #[error("failed to write config file {}: {reason}", .path.display())]
    Write { path: PathBuf, reason: String },

    #[error("failed to parse config file {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    /// A `ROUTECODEC_*` variable whose value does not parse
    #[error("invalid value '{value}' in {var}: {reason}")]
    InvalidEnv { var: &'static str, value: String, reason: String },

    /// A loaded setting that fails validation
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    /// Dotted setting key or environment variable the error is about, if any
    pub fn key(&self) -> Option<&'static str> {
        match self {
            ConfigError::InvalidEnv { var, .. } => Some(*var),
            ConfigError::Invalid { key, .. } => Some(*key),
            _ => None,
        }
    }
}
