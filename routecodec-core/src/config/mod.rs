//! Configuration management for the codec
//!
//! Defaults, environment overrides (`ROUTECODEC_<SECTION>_<KEY>`), and TOML
//! files, validated before use.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::CodecError;
use crate::logging::LogLevel;
use crate::text::TextEncoding;

mod error;

pub use error::ConfigError;

/// Main codec configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Codec configuration
    pub codec: CodecSection,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Codec configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecSection {
    /// Encoding used when a text call names none
    pub default_text_encoding: TextEncoding,

    /// JSON schema definition for messages this process sends
    pub outbound_schema: Option<PathBuf>,

    /// JSON schema definition for messages this process receives
    pub inbound_schema: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

impl CodecConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: ROUTECODEC_<SECTION>_<KEY>
    /// Example: ROUTECODEC_CODEC_OUTBOUND_SCHEMA=/etc/routecodec/outbound.json
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay any `ROUTECODEC_*` variables onto this configuration
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // Codec config
        if let Ok(encoding) = env::var("ROUTECODEC_CODEC_DEFAULT_TEXT_ENCODING") {
            self.codec.default_text_encoding =
                encoding.parse().map_err(|e: CodecError| ConfigError::InvalidEnv {
                    var: "ROUTECODEC_CODEC_DEFAULT_TEXT_ENCODING",
                    value: encoding.clone(),
                    reason: e.to_string(),
                })?;
        }
        if let Ok(path) = env::var("ROUTECODEC_CODEC_OUTBOUND_SCHEMA") {
            self.codec.outbound_schema = Some(PathBuf::from(path));
        }
        if let Ok(path) = env::var("ROUTECODEC_CODEC_INBOUND_SCHEMA") {
            self.codec.inbound_schema = Some(PathBuf::from(path));
        }

        // Logging config
        if let Ok(level) = env::var("ROUTECODEC_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(json) = env::var("ROUTECODEC_LOG_JSON") {
            self.logging.json_format =
                json.parse().map_err(|e: std::str::ParseBoolError| ConfigError::InvalidEnv {
                    var: "ROUTECODEC_LOG_JSON",
                    value: json.clone(),
                    reason: e.to_string(),
                })?;
        }

        Ok(())
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, path) in [
            ("codec.outbound_schema", &self.codec.outbound_schema),
            ("codec.inbound_schema", &self.codec.inbound_schema),
        ] {
            if matches!(path, Some(p) if p.as_os_str().is_empty()) {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "schema path must not be empty".to_string(),
                });
            }
        }

        if let Err(e) = self.logging.level.parse::<LogLevel>() {
            return Err(ConfigError::Invalid { key: "logging.level", reason: e.to_string() });
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CodecConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.codec.default_text_encoding, TextEncoding::Base64);
        assert!(config.codec.outbound_schema.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = CodecConfig::default();
        config.codec.inbound_schema = Some(PathBuf::new());
        let err = config.validate().unwrap_err();
        assert_eq!(err.key(), Some("codec.inbound_schema"));
        assert_eq!(err.to_string(), "invalid codec.inbound_schema: schema path must not be empty");

        config = CodecConfig::default();
        config.codec.inbound_schema = Some(PathBuf::from("inbound.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level_validation() {
        let mut config = CodecConfig::default();

        config.logging.level = "invalid".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "logging.level", .. })
        ));

        config.logging.level = "debug".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routecodec.toml");

        let mut config = CodecConfig::default();
        config.codec.default_text_encoding = TextEncoding::Hex;
        config.codec.outbound_schema = Some(PathBuf::from("/etc/routecodec/outbound.json"));
        config.logging.json_format = true;
        config.save_to_file(&path).unwrap();

        assert_eq!(CodecConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[codec]\ndefault_text_encoding = \"latin1\"\n").unwrap();

        let config = CodecConfig::from_file(file.path()).unwrap();
        assert_eq!(config.codec.default_text_encoding, TextEncoding::Latin1);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_invalid_files() {
        match CodecConfig::from_file("/nonexistent/routecodec.toml") {
            Err(ConfigError::Read { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/routecodec.toml"))
            }
            other => panic!("unexpected {:?}", other),
        }

        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[codec]\ndefault_text_encoding = \"utf16\"\n").unwrap();
        match CodecConfig::from_file(file.path()) {
            Err(err @ ConfigError::Parse { .. }) => {
                assert!(err.to_string().contains(&file.path().display().to_string()))
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
