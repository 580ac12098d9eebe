//! Typed message instances

use std::collections::BTreeMap;
use std::fmt;

/// A decoded or constructed field value
///
/// Integer variants carry the value only; the field's declared scalar type
/// decides its wire encoding (e.g. `Int32` serves int32, sint32 and sfixed32).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Float(f32),
    Double(f64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Enum(i32),
    Message(DynamicMessage),
    List(Vec<FieldValue>),
    Map(BTreeMap<MapKey, FieldValue>),
}

/// Key of a map field entry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Bool(bool),
    String(String),
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Int32(v) => write!(f, "{}", v),
            MapKey::Int64(v) => write!(f, "{}", v),
            MapKey::Uint32(v) => write!(f, "{}", v),
            MapKey::Uint64(v) => write!(f, "{}", v),
            MapKey::Bool(v) => write!(f, "{}", v),
            MapKey::String(v) => f.write_str(v),
        }
    }
}

/// An instance of one message type, keyed by field number
///
/// The instance remembers which tree and type produced it so it is never
/// interpreted against a different schema.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMessage {
    tree_id: u64,
    type_index: usize,
    fields: BTreeMap<u32, FieldValue>,
}

impl DynamicMessage {
    pub(crate) fn new(tree_id: u64, type_index: usize) -> Self {
        DynamicMessage { tree_id, type_index, fields: BTreeMap::new() }
    }

    pub(crate) fn tree_id(&self) -> u64 {
        self.tree_id
    }

    pub(crate) fn type_index(&self) -> usize {
        self.type_index
    }

    pub(crate) fn set(&mut self, number: u32, value: FieldValue) {
        self.fields.insert(number, value);
    }

    pub(crate) fn entry_mut(&mut self, number: u32) -> Option<&mut FieldValue> {
        self.fields.get_mut(&number)
    }

    pub fn get(&self, number: u32) -> Option<&FieldValue> {
        self.fields.get(&number)
    }

    pub fn has(&self, number: u32) -> bool {
        self.fields.contains_key(&number)
    }

    /// Set fields in ascending field-number order
    pub fn fields(&self) -> impl Iterator<Item = (u32, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_iterate_by_number() {
        let mut msg = DynamicMessage::new(0, 0);
        msg.set(3, FieldValue::Bool(true));
        msg.set(1, FieldValue::Int32(5));
        let numbers: Vec<u32> = msg.fields().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![1, 3]);
        assert!(msg.has(3));
        assert!(!msg.has(2));
    }

    #[test]
    fn test_last_set_wins() {
        let mut msg = DynamicMessage::new(0, 0);
        msg.set(1, FieldValue::Int32(1));
        msg.set(1, FieldValue::Int32(2));
        assert_eq!(msg.get(1), Some(&FieldValue::Int32(2)));
        assert_eq!(msg.len(), 1);
    }

    #[test]
    fn test_map_key_display() {
        assert_eq!(MapKey::Int64(-3).to_string(), "-3");
        assert_eq!(MapKey::Bool(true).to_string(), "true");
        assert_eq!(MapKey::String("a.b".to_string()).to_string(), "a.b");
    }
}
