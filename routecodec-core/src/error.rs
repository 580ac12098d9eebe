/*
    error.rs - Error types for the codec

    Every fault is surfaced to the immediate caller; nothing in the crate
    retries. The only swallowed case is the empty result of
    `Codec::encode_to_byte_array`, which is returned as `Ok(None)`.
*/

use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while loading schemas or encoding/decoding messages
#[derive(Debug, Error)]
pub enum CodecError {
    /// Route does not resolve to a message type in the selected tree
    #[error("not such route {0}")]
    RouteNotFound(String),

    /// Payload failed verification against the message descriptor
    #[error("invalid payload for {route}: {reason}")]
    PayloadInvalid { route: String, reason: String },

    /// Bytes do not parse as an instance of the target message
    #[error("malformed message for {route}: {reason}")]
    DecodeMalformed { route: String, reason: String },

    /// Text could not be transcoded into bytes
    #[error("invalid {encoding} text: {reason}")]
    TextDecodeInvalid { encoding: String, reason: String },

    /// Text encoding name is not recognized
    #[error("unknown text encoding: {0}")]
    UnknownTextEncoding(String),

    /// Schema definition is structurally invalid
    #[error("schema parse error at {path}: {reason}")]
    SchemaParseError { path: String, reason: String },

    /// Side discriminator other than outbound/inbound
    #[error("invalid schema side: {0}")]
    InvalidSide(String),

    /// Schema file could not be read
    #[error("I/O error: {0}")]
    Io(String),
}

impl CodecError {
    pub(crate) fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        CodecError::SchemaParseError { path: path.into(), reason: reason.into() }
    }

    /// Short stable name of the error kind, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            CodecError::RouteNotFound(_) => "route_not_found",
            CodecError::PayloadInvalid { .. } => "payload_invalid",
            CodecError::DecodeMalformed { .. } => "decode_malformed",
            CodecError::TextDecodeInvalid { .. } => "text_decode_invalid",
            CodecError::UnknownTextEncoding(_) => "unknown_text_encoding",
            CodecError::SchemaParseError { .. } => "schema_parse_error",
            CodecError::InvalidSide(_) => "invalid_side",
            CodecError::Io(_) => "io",
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        CodecError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_not_found_mentions_route() {
        let err = CodecError::RouteNotFound("chat.Message".to_string());
        assert!(err.to_string().contains("chat.Message"));
        assert_eq!(err.kind(), "route_not_found");
    }

    #[test]
    fn test_payload_invalid_carries_reason() {
        let err = CodecError::PayloadInvalid {
            route: "chat.Message".to_string(),
            reason: "missing required 'from'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid payload for chat.Message: missing required 'from'"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CodecError = io.into();
        assert!(matches!(err, CodecError::Io(_)));
    }
}
