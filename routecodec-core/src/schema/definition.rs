//! Raw schema definitions
//!
//! A definition is the already-parsed JSON descriptor tree (the
//! `Root.fromJSON` shape of protobuf.js). It is kept verbatim by the
//! registry; the lookup tree is derived from it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::{CodecError, CodecResult};

/// An unvalidated schema definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDefinition(Value);

impl SchemaDefinition {
    pub fn new(value: Value) -> Self {
        SchemaDefinition(value)
    }

    /// Parse a definition from JSON text
    pub fn from_json_str(text: &str) -> CodecResult<Self> {
        let value = serde_json::from_str(text)
            .map_err(|e| CodecError::schema("$", format!("invalid JSON: {}", e)))?;
        Ok(SchemaDefinition(value))
    }

    /// Load a definition from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> CodecResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CodecError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&contents)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for SchemaDefinition {
    fn from(value: Value) -> Self {
        SchemaDefinition(value)
    }
}
