//! Handle to one message type within a schema tree

use std::fmt;
use std::sync::Arc;

use super::create::create_message;
use super::payload::Payload;
use super::project::to_payload;
use super::value::DynamicMessage;
use super::verify::verify_message;
use crate::error::{CodecError, CodecResult};
use crate::schema::{FieldDescriptor, FieldType, MessageType, SchemaTree};
use crate::wire;

/// Resolved message type
///
/// Holds its tree alive, so a registry reload while the descriptor is in
/// use does not affect it. Obtained per call from a registry; not meant to
/// be cached across reloads.
#[derive(Clone)]
pub struct MessageDescriptor {
    tree: Arc<SchemaTree>,
    index: usize,
}

impl MessageDescriptor {
    pub(crate) fn new(tree: Arc<SchemaTree>, index: usize) -> Self {
        MessageDescriptor { tree, index }
    }

    /// Fully qualified dotted name, e.g. `chat.Message`
    pub fn full_name(&self) -> &str {
        self.message_type().full_name()
    }

    pub fn name(&self) -> &str {
        self.message_type().name()
    }

    pub fn message_type(&self) -> &MessageType {
        self.tree.message(self.index)
    }

    /// Schema type name of a field, e.g. `uint32`, `chat.Kind` or `map<string, int32>`
    pub fn field_type_name(&self, field: &FieldDescriptor) -> String {
        let value = match field.field_type() {
            FieldType::Scalar(scalar) => scalar.name().to_string(),
            FieldType::Enum(index) => self.tree.enum_type(index).full_name().to_string(),
            FieldType::Message(index) => self.tree.message(index).full_name().to_string(),
        };
        match field.map_key() {
            Some(key) => format!("map<{}, {}>", key.name(), value),
            None => value,
        }
    }

    /// Check a payload's shape; `Err` carries the first diagnostic
    pub fn verify(&self, payload: &Payload) -> Result<(), String> {
        verify_message(&self.tree, self.index, payload.as_map(), 0)
    }

    /// Build a typed message from a payload
    pub fn create(&self, payload: &Payload) -> CodecResult<DynamicMessage> {
        create_message(&self.tree, self.index, payload.as_map(), 0)
            .map_err(|reason| self.payload_invalid(reason))
    }

    /// Serialize a message of this type
    pub fn encode(&self, message: &DynamicMessage) -> CodecResult<Vec<u8>> {
        self.check_owner(message)?;
        let mut buf = Vec::new();
        wire::encode_message(&self.tree, message, &mut buf)
            .map_err(|reason| self.payload_invalid(reason))?;
        Ok(buf)
    }

    /// Parse one complete message of this type
    pub fn decode(&self, bytes: &[u8]) -> CodecResult<DynamicMessage> {
        wire::decode_message(&self.tree, self.index, bytes, 0).map_err(|reason| {
            CodecError::DecodeMalformed { route: self.full_name().to_string(), reason }
        })
    }

    /// Project a message of this type to a payload with defaults filled in
    pub fn to_payload(&self, message: &DynamicMessage) -> CodecResult<Payload> {
        self.check_owner(message)?;
        Ok(Payload::from(to_payload(&self.tree, message)))
    }

    fn check_owner(&self, message: &DynamicMessage) -> CodecResult<()> {
        if message.tree_id() != self.tree.id() || message.type_index() != self.index {
            return Err(self.payload_invalid("message belongs to a different type".to_string()));
        }
        Ok(())
    }

    fn payload_invalid(&self, reason: String) -> CodecError {
        CodecError::PayloadInvalid { route: self.full_name().to_string(), reason }
    }
}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDescriptor")
            .field("full_name", &self.full_name())
            .field("tree", &self.tree.id())
            .finish()
    }
}
