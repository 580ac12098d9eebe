//! Structured payloads exchanged with callers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An untyped mapping from field name to value
///
/// Shape is only checked when the payload is encoded against a message
/// descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Payload(Map::new())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Insert a field, returning the previous value
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Payload(map)
    }
}

/// Only JSON objects are payloads; anything else is handed back
impl TryFrom<Value> for Payload {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Payload(map)),
            other => Err(other),
        }
    }
}

impl From<Payload> for Value {
    fn from(payload: Payload) -> Self {
        payload.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_try_from_object() {
        let payload = Payload::try_from(json!({"from": 1})).unwrap();
        assert_eq!(payload.get("from"), Some(&json!(1)));
        assert_eq!(payload.len(), 1);
    }

    #[test]
    fn test_try_from_non_object() {
        let rejected = Payload::try_from(json!([1, 2])).unwrap_err();
        assert_eq!(rejected, json!([1, 2]));
    }

    #[test]
    fn test_serde_transparent() {
        let payload: Payload = serde_json::from_str(r#"{"a":"b"}"#).unwrap();
        assert_eq!(serde_json::to_string(&payload).unwrap(), r#"{"a":"b"}"#);
    }
}
