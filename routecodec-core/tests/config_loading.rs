//! Building a codec from configuration files and environment overrides

use anyhow::Result;
use routecodec_core::{Codec, CodecConfig, CodecError, ConfigError, Payload, Side, TextEncoding};
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_schema(dir: &TempDir, name: &str, message: &str) -> Result<PathBuf> {
    let path = dir.path().join(name);
    let schema = json!({
        "nested": { "chat": { "nested": {
            message: { "fields": { "from": { "type": "int32", "id": 1 } } }
        } } }
    });
    std::fs::write(&path, schema.to_string())?;
    Ok(path)
}

#[test]
fn test_codec_from_config_file() -> Result<()> {
    let dir = TempDir::new()?;
    let mut config = CodecConfig::default();
    config.codec.default_text_encoding = TextEncoding::Hex;
    config.codec.outbound_schema = Some(write_schema(&dir, "outbound.json", "Request")?);
    config.codec.inbound_schema = Some(write_schema(&dir, "inbound.json", "Response")?);

    let config_path = dir.path().join("routecodec.toml");
    config.save_to_file(&config_path)?;
    let loaded = CodecConfig::from_file(&config_path)?;

    let codec = Codec::from_config(&loaded)?;
    assert_eq!(codec.default_encoding(), TextEncoding::Hex);
    assert!(codec.lookup(Side::Outbound, "chat.Request").is_some());
    assert!(codec.lookup(Side::Inbound, "chat.Response").is_some());

    let mut payload = Payload::new();
    payload.insert("from", json!(1));
    assert_eq!(codec.encode_to_text("chat.Request", &payload, None)?, "0801");
    Ok(())
}

#[test]
fn test_codec_from_config_missing_schema() {
    let mut config = CodecConfig::default();
    config.codec.inbound_schema = Some(PathBuf::from("/nonexistent/inbound.json"));
    assert!(matches!(Codec::from_config(&config), Err(CodecError::Io(_))));
}

#[test]
fn test_config_from_env() -> Result<()> {
    // the only test in this binary that touches ROUTECODEC_* variables
    std::env::set_var("ROUTECODEC_CODEC_DEFAULT_TEXT_ENCODING", "base64url");
    std::env::set_var("ROUTECODEC_CODEC_OUTBOUND_SCHEMA", "/etc/routecodec/outbound.json");
    std::env::set_var("ROUTECODEC_LOG_LEVEL", "debug");
    std::env::set_var("ROUTECODEC_LOG_JSON", "true");

    let config = CodecConfig::from_env()?;
    assert_eq!(config.codec.default_text_encoding, TextEncoding::Base64Url);
    assert_eq!(config.codec.outbound_schema, Some(PathBuf::from("/etc/routecodec/outbound.json")));
    assert_eq!(config.codec.inbound_schema, None);
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json_format);

    std::env::set_var("ROUTECODEC_LOG_JSON", "maybe");
    match CodecConfig::from_env() {
        Err(err @ ConfigError::InvalidEnv { .. }) => {
            assert_eq!(err.key(), Some("ROUTECODEC_LOG_JSON"));
            assert!(err.to_string().contains("'maybe'"));
        }
        other => panic!("unexpected {:?}", other),
    }

    for key in [
        "ROUTECODEC_CODEC_DEFAULT_TEXT_ENCODING",
        "ROUTECODEC_CODEC_OUTBOUND_SCHEMA",
        "ROUTECODEC_LOG_LEVEL",
        "ROUTECODEC_LOG_JSON",
    ] {
        std::env::remove_var(key);
    }
    Ok(())
}
