//! Typed message to payload, with defaults filled in
//!
//! Keys follow field declaration order. Absent scalars and enums take the
//! declared default or the zero value, absent repeated fields become `[]`
//! and absent maps `{}`. Absent sub-messages and oneof members are omitted.

use serde_json::{Map, Value};

use super::convert;
use super::value::{DynamicMessage, FieldValue};
use crate::schema::{FieldDescriptor, FieldType, SchemaTree};

pub(crate) fn to_payload(tree: &SchemaTree, message: &DynamicMessage) -> Map<String, Value> {
    let message_type = tree.message(message.type_index());
    let mut object = Map::new();
    for field in message_type.fields() {
        let value = match message.get(field.number()) {
            Some(value) => value_to_json(tree, value),
            None => match default_json(tree, field) {
                Some(value) => value,
                None => continue,
            },
        };
        object.insert(field.name().to_string(), value);
    }
    object
}

fn value_to_json(tree: &SchemaTree, value: &FieldValue) -> Value {
    match value {
        FieldValue::Message(nested) => Value::Object(to_payload(tree, nested)),
        FieldValue::List(items) => {
            Value::Array(items.iter().map(|item| value_to_json(tree, item)).collect())
        }
        FieldValue::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(key, entry)| (key.to_string(), value_to_json(tree, entry)))
                .collect(),
        ),
        scalar => convert::scalar_to_json(scalar),
    }
}

fn default_json(tree: &SchemaTree, field: &FieldDescriptor) -> Option<Value> {
    if field.is_map() {
        return Some(Value::Object(Map::new()));
    }
    if field.is_repeated() {
        return Some(Value::Array(Vec::new()));
    }
    if field.oneof().is_some() {
        return None;
    }
    if let Some(declared) = field.declared_default() {
        return Some(convert::scalar_to_json(declared));
    }
    match field.field_type() {
        FieldType::Scalar(scalar) => Some(convert::scalar_to_json(&convert::zero_value(scalar))),
        FieldType::Enum(index) => Some(Value::from(tree.enum_type(index).default_value())),
        FieldType::Message(_) => None,
    }
}
