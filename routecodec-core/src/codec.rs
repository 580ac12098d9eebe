/*
    codec.rs - Route-addressed message codec

    Encode resolves routes against the outbound registry, decode against the
    inbound one. Both sides are independent trees: a route present only in
    the outbound schema cannot be decoded, and vice versa.

    Encode path:  lookup -> verify -> create -> wire encode
    Decode path:  lookup -> wire decode -> project with defaults

    Every call resolves its descriptor afresh, so a definition swapped in by
    `set_outbound_definition` / `set_inbound_definition` is used from the
    next call on, while calls already in flight finish on the tree they
    started with.
*/

use tracing::warn;

use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};
use crate::message::{MessageDescriptor, Payload};
use crate::metrics;
use crate::registry::{SchemaRegistry, Side};
use crate::route;
use crate::schema::SchemaDefinition;
use crate::text::TextEncoding;

/// Encoder/decoder over an outbound and an inbound schema
#[derive(Debug)]
pub struct Codec {
    outbound: SchemaRegistry,
    inbound: SchemaRegistry,
    default_encoding: TextEncoding,
}

impl Codec {
    /// Build both trees from their definitions
    pub fn new(outbound: SchemaDefinition, inbound: SchemaDefinition) -> CodecResult<Self> {
        Ok(Codec {
            outbound: SchemaRegistry::with_definition(Side::Outbound, outbound)?,
            inbound: SchemaRegistry::with_definition(Side::Inbound, inbound)?,
            default_encoding: TextEncoding::default(),
        })
    }

    /// Codec with no schema loaded on either side
    pub fn empty() -> Self {
        Codec {
            outbound: SchemaRegistry::new(Side::Outbound),
            inbound: SchemaRegistry::new(Side::Inbound),
            default_encoding: TextEncoding::default(),
        }
    }

    /// Build a codec from configuration, loading whichever schema files it names
    pub fn from_config(config: &CodecConfig) -> CodecResult<Self> {
        let codec = Self::empty().with_default_encoding(config.codec.default_text_encoding);
        if let Some(path) = &config.codec.outbound_schema {
            codec.outbound.load_file(path)?;
        }
        if let Some(path) = &config.codec.inbound_schema {
            codec.inbound.load_file(path)?;
        }
        Ok(codec)
    }

    pub fn with_default_encoding(mut self, encoding: TextEncoding) -> Self {
        self.default_encoding = encoding;
        self
    }

    pub fn default_encoding(&self) -> TextEncoding {
        self.default_encoding
    }

    pub fn registry(&self, side: Side) -> &SchemaRegistry {
        match side {
            Side::Outbound => &self.outbound,
            Side::Inbound => &self.inbound,
        }
    }

    /// Resolve `route` against one side's tree
    pub fn lookup(&self, side: Side, route: &str) -> Option<MessageDescriptor> {
        self.registry(side).lookup_raw(route)
    }

    /// Replace the outbound definition; the previous one stays on failure
    pub fn set_outbound_definition(&self, definition: SchemaDefinition) -> CodecResult<()> {
        self.outbound.load(definition)
    }

    /// Replace the inbound definition; the previous one stays on failure
    pub fn set_inbound_definition(&self, definition: SchemaDefinition) -> CodecResult<()> {
        self.inbound.load(definition)
    }

    /// Flat form of a route (`a.b.C` -> `a_b_C`)
    pub fn normalize_route(route: &str) -> String {
        route::normalize_route(route)
    }

    /// Verify `payload` and serialize it as the outbound message `route`
    pub fn encode(&self, route: &str, payload: &Payload) -> CodecResult<Vec<u8>> {
        let result = self.encode_message(route, payload);
        metrics::record_encode(&result);
        result
    }

    fn encode_message(&self, route: &str, payload: &Payload) -> CodecResult<Vec<u8>> {
        let descriptor = self.outbound.lookup_type(route)?;
        descriptor
            .verify(payload)
            .map_err(|reason| CodecError::PayloadInvalid { route: route.to_string(), reason })?;
        let message = descriptor.create(payload)?;
        descriptor.encode(&message)
    }

    /// Like [`encode`](Self::encode), but an empty encoding yields `Ok(None)`
    pub fn encode_to_byte_array(
        &self,
        route: &str,
        payload: &Payload,
    ) -> CodecResult<Option<Vec<u8>>> {
        let bytes = self.encode(route, payload)?;
        if bytes.is_empty() {
            warn!(route, "Encoded message is empty");
            return Ok(None);
        }
        Ok(Some(bytes))
    }

    /// Encode, then render the bytes as text (default encoding when `None`)
    pub fn encode_to_text(
        &self,
        route: &str,
        payload: &Payload,
        encoding: Option<TextEncoding>,
    ) -> CodecResult<String> {
        let bytes = self.encode(route, payload)?;
        Ok(encoding.unwrap_or(self.default_encoding).encode(&bytes))
    }

    /// Parse `bytes` as the inbound message `route` and project it to a payload
    pub fn decode(&self, route: &str, bytes: &[u8]) -> CodecResult<Payload> {
        let result = self.decode_message(route, bytes);
        metrics::record_decode(bytes.len(), &result);
        result
    }

    fn decode_message(&self, route: &str, bytes: &[u8]) -> CodecResult<Payload> {
        let descriptor = self.inbound.lookup_type(route)?;
        let message = descriptor.decode(bytes)?;
        descriptor.to_payload(&message)
    }

    /// Transcode `text` to bytes (default encoding when `None`), then decode
    pub fn decode_from_text(
        &self,
        route: &str,
        text: &str,
        encoding: Option<TextEncoding>,
    ) -> CodecResult<Payload> {
        let bytes = encoding.unwrap_or(self.default_encoding).decode(text)?;
        self.decode(route, &bytes)
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn chat_definition() -> SchemaDefinition {
        SchemaDefinition::new(json!({
            "nested": { "chat": { "nested": {
                "Message": { "fields": {
                    "from": { "type": "int32", "id": 1 },
                    "to": { "type": "int32", "id": 2 },
                    "content": { "type": "string", "id": 3 }
                } }
            } } }
        }))
    }

    fn codec() -> Codec {
        Codec::new(chat_definition(), chat_definition()).unwrap()
    }

    fn payload(value: Value) -> Payload {
        Payload::try_from(value).unwrap()
    }

    #[test]
    fn test_chat_message_scenario() {
        let codec = codec();
        let bytes = codec
            .encode("chat.Message", &payload(json!({ "from": 1, "to": 2, "content": "hi" })))
            .unwrap();
        assert_eq!(bytes, vec![0x08, 0x01, 0x10, 0x02, 0x1a, 0x02, 0x68, 0x69]);

        let decoded = codec.decode("chat.Message", &bytes).unwrap();
        assert_eq!(decoded.into_value(), json!({ "from": 1, "to": 2, "content": "hi" }));
    }

    #[test]
    fn test_unknown_route() {
        let err = codec().encode("chat.Nope", &Payload::new()).unwrap_err();
        assert_eq!(err.to_string(), "not such route chat.Nope");
    }

    #[test]
    fn test_empty_encoding_is_none() {
        let codec = codec();
        assert_eq!(codec.encode_to_byte_array("chat.Message", &Payload::new()).unwrap(), None);
        assert_eq!(
            codec.encode_to_byte_array("chat.Message", &payload(json!({ "from": 1 }))).unwrap(),
            Some(vec![0x08, 0x01])
        );
    }

    #[test]
    fn test_text_roundtrip_with_default_encoding() {
        let codec = codec().with_default_encoding(TextEncoding::Hex);
        let text = codec.encode_to_text("chat.Message", &payload(json!({ "to": 2 })), None).unwrap();
        assert_eq!(text, "1002");

        let decoded = codec.decode_from_text("chat.Message", &text, None).unwrap();
        assert_eq!(decoded.get("to"), Some(&json!(2)));
        assert_eq!(decoded.get("from"), Some(&json!(0)));
        assert_eq!(decoded.get("content"), Some(&json!("")));

        let b64 = codec
            .encode_to_text("chat.Message", &payload(json!({ "to": 2 })), Some(TextEncoding::Base64))
            .unwrap();
        assert_eq!(b64, "EAI=");
    }

    #[test]
    fn test_decode_from_unpadded_base64() {
        let decoded =
            codec().decode_from_text("chat.Message", "EAI", Some(TextEncoding::Base64)).unwrap();
        assert_eq!(decoded.get("to"), Some(&json!(2)));
        assert_eq!(decoded.get("from"), Some(&json!(0)));
    }

    #[test]
    fn test_decode_from_bad_text() {
        let err = codec().decode_from_text("chat.Message", "zz", Some(TextEncoding::Hex)).unwrap_err();
        assert!(matches!(err, CodecError::TextDecodeInvalid { .. }));
    }

    #[test]
    fn test_lookup_by_side() {
        let codec = Codec::empty();
        codec.set_outbound_definition(chat_definition()).unwrap();
        assert!(codec.lookup(Side::Outbound, "chat.Message").is_some());
        assert!(codec.lookup(Side::Inbound, "chat.Message").is_none());
        assert!(codec.registry(Side::Inbound).definition().is_none());
    }

    #[test]
    fn test_normalize_route() {
        assert_eq!(Codec::normalize_route("chat.Message"), "chat_Message");
        assert!(codec().lookup(Side::Outbound, "chat_Message").is_none());
    }

    #[test]
    fn test_codec_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Codec>();
    }
}
