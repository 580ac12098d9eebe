//! Resolved schema types
//!
//! These are the immutable building blocks of a [`SchemaTree`](super::SchemaTree).
//! Type references between fields are resolved to indices into the owning
//! tree, so recursive message types need no reference cycles.

use std::collections::HashMap;

use crate::message::FieldValue;

/// Scalar field types of the wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Double,
    Float,
    Int32,
    Uint32,
    Sint32,
    Fixed32,
    Sfixed32,
    Int64,
    Uint64,
    Sint64,
    Fixed64,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl ScalarType {
    /// Parse a schema type name into a scalar type
    pub fn from_name(name: &str) -> Option<Self> {
        let scalar = match name {
            "double" => ScalarType::Double,
            "float" => ScalarType::Float,
            "int32" => ScalarType::Int32,
            "uint32" => ScalarType::Uint32,
            "sint32" => ScalarType::Sint32,
            "fixed32" => ScalarType::Fixed32,
            "sfixed32" => ScalarType::Sfixed32,
            "int64" => ScalarType::Int64,
            "uint64" => ScalarType::Uint64,
            "sint64" => ScalarType::Sint64,
            "fixed64" => ScalarType::Fixed64,
            "sfixed64" => ScalarType::Sfixed64,
            "bool" => ScalarType::Bool,
            "string" => ScalarType::String,
            "bytes" => ScalarType::Bytes,
            _ => return None,
        };
        Some(scalar)
    }

    /// Schema name of the scalar type
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Double => "double",
            ScalarType::Float => "float",
            ScalarType::Int32 => "int32",
            ScalarType::Uint32 => "uint32",
            ScalarType::Sint32 => "sint32",
            ScalarType::Fixed32 => "fixed32",
            ScalarType::Sfixed32 => "sfixed32",
            ScalarType::Int64 => "int64",
            ScalarType::Uint64 => "uint64",
            ScalarType::Sint64 => "sint64",
            ScalarType::Fixed64 => "fixed64",
            ScalarType::Sfixed64 => "sfixed64",
            ScalarType::Bool => "bool",
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
        }
    }

    /// Whether repeated fields of this type may use packed encoding
    pub fn is_packable(&self) -> bool {
        !matches!(self, ScalarType::String | ScalarType::Bytes)
    }

    /// Whether this type may be used as a map key
    pub fn is_valid_map_key(&self) -> bool {
        !matches!(self, ScalarType::Double | ScalarType::Float | ScalarType::Bytes)
    }
}

/// Resolved type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ScalarType),
    /// Index of an enum in the owning tree
    Enum(usize),
    /// Index of a message type in the owning tree
    Message(usize),
}

impl FieldType {
    pub fn is_packable(&self) -> bool {
        match self {
            FieldType::Scalar(scalar) => scalar.is_packable(),
            FieldType::Enum(_) => true,
            FieldType::Message(_) => false,
        }
    }
}

/// Field cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldRule {
    #[default]
    Optional,
    Required,
    Repeated,
}

impl FieldRule {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "optional" => Some(FieldRule::Optional),
            "required" => Some(FieldRule::Required),
            "repeated" => Some(FieldRule::Repeated),
            _ => None,
        }
    }
}

/// A single field of a message type
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub(crate) name: String,
    pub(crate) number: u32,
    pub(crate) rule: FieldRule,
    pub(crate) field_type: FieldType,
    /// Key type for map fields
    pub(crate) map_key: Option<ScalarType>,
    pub(crate) packed: bool,
    /// Declared default, already converted to the field's type
    pub(crate) default: Option<FieldValue>,
    /// Index of the oneof this field belongs to
    pub(crate) oneof: Option<usize>,
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn rule(&self) -> FieldRule {
        self.rule
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn map_key(&self) -> Option<ScalarType> {
        self.map_key
    }

    pub fn is_map(&self) -> bool {
        self.map_key.is_some()
    }

    pub fn is_repeated(&self) -> bool {
        self.rule == FieldRule::Repeated
    }

    pub fn is_required(&self) -> bool {
        self.rule == FieldRule::Required
    }

    pub fn is_packed(&self) -> bool {
        self.packed
    }

    pub fn oneof(&self) -> Option<usize> {
        self.oneof
    }

    pub fn declared_default(&self) -> Option<&FieldValue> {
        self.default.as_ref()
    }
}

/// A oneof group: at most one member may be set
#[derive(Debug, Clone)]
pub struct OneofDescriptor {
    pub(crate) name: String,
    /// Indices into the owning message's field list
    pub(crate) fields: Vec<usize>,
}

impl OneofDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_indices(&self) -> &[usize] {
        &self.fields
    }
}

/// A message type, with fields in declaration order
#[derive(Debug, Clone)]
pub struct MessageType {
    name: String,
    full_name: String,
    fields: Vec<FieldDescriptor>,
    oneofs: Vec<OneofDescriptor>,
    by_name: HashMap<String, usize>,
    by_number: HashMap<u32, usize>,
}

impl MessageType {
    pub(crate) fn new(name: &str, full_name: &str) -> Self {
        MessageType {
            name: name.to_string(),
            full_name: full_name.to_string(),
            fields: Vec::new(),
            oneofs: Vec::new(),
            by_name: HashMap::new(),
            by_number: HashMap::new(),
        }
    }

    /// Append a field; returns false if its number is already taken
    pub(crate) fn push_field(&mut self, field: FieldDescriptor) -> bool {
        if self.by_number.contains_key(&field.number) {
            return false;
        }
        let index = self.fields.len();
        self.by_name.insert(field.name.clone(), index);
        self.by_number.insert(field.number, index);
        self.fields.push(field);
        true
    }

    pub(crate) fn push_oneof(&mut self, oneof: OneofDescriptor) {
        let oneof_index = self.oneofs.len();
        for &field_index in &oneof.fields {
            self.fields[field_index].oneof = Some(oneof_index);
        }
        self.oneofs.push(oneof);
    }

    pub(crate) fn field_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn oneofs(&self) -> &[OneofDescriptor] {
        &self.oneofs
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.by_number.get(&number).map(|&i| &self.fields[i])
    }
}

/// An enum type, with values in declaration order
#[derive(Debug, Clone)]
pub struct EnumType {
    pub(crate) full_name: String,
    pub(crate) values: Vec<(String, i32)>,
}

impl EnumType {
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn values(&self) -> &[(String, i32)] {
        &self.values
    }

    /// First declared value, or 0 for an empty enum
    pub fn default_value(&self) -> i32 {
        self.values.first().map(|(_, v)| *v).unwrap_or(0)
    }

    pub fn contains(&self, value: i32) -> bool {
        self.values.iter().any(|(_, v)| *v == value)
    }

    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }
}
