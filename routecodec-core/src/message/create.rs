//! Payload to typed message

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::convert;
use super::value::{DynamicMessage, FieldValue};
use super::verify::invalid;
use crate::schema::{FieldDescriptor, FieldType, SchemaTree};
use crate::wire::RECURSION_LIMIT;

/// Build a message of type `index` from `object`
///
/// Null and unknown keys are ignored. Callers verify first; the conversion
/// still fails rather than guessing when a value does not fit.
pub(crate) fn create_message(
    tree: &SchemaTree,
    index: usize,
    object: &Map<String, Value>,
    depth: u32,
) -> Result<DynamicMessage, String> {
    if depth > RECURSION_LIMIT {
        return Err("max depth exceeded".to_string());
    }

    let mut message = DynamicMessage::new(tree.id(), index);
    for field in tree.message(index).fields() {
        let value = match object.get(field.name()) {
            None | Some(Value::Null) => continue,
            Some(value) => value,
        };
        message.set(field.number(), create_field(tree, field, value, depth)?);
    }
    Ok(message)
}

fn create_field(
    tree: &SchemaTree,
    field: &FieldDescriptor,
    value: &Value,
    depth: u32,
) -> Result<FieldValue, String> {
    if let Some(key_type) = field.map_key() {
        let entries =
            value.as_object().ok_or_else(|| format!("{}: object expected", field.name()))?;
        let mut map = BTreeMap::new();
        for (key, entry) in entries {
            let key =
                convert::map_key_from_str(key_type, key).map_err(|reason| invalid(field, reason))?;
            map.insert(key, create_value(tree, field, entry, depth)?);
        }
        return Ok(FieldValue::Map(map));
    }

    if field.is_repeated() {
        let items = value.as_array().ok_or_else(|| format!("{}: array expected", field.name()))?;
        return items
            .iter()
            .map(|item| create_value(tree, field, item, depth))
            .collect::<Result<Vec<_>, _>>()
            .map(FieldValue::List);
    }

    create_value(tree, field, value, depth)
}

fn create_value(
    tree: &SchemaTree,
    field: &FieldDescriptor,
    value: &Value,
    depth: u32,
) -> Result<FieldValue, String> {
    match field.field_type() {
        FieldType::Scalar(scalar) => {
            convert::scalar_from_json(scalar, value).map_err(|reason| invalid(field, reason))
        }
        FieldType::Enum(index) => convert::enum_from_json(tree.enum_type(index), value)
            .map(FieldValue::Enum)
            .map_err(|reason| invalid(field, reason)),
        FieldType::Message(index) => {
            let object = value.as_object().ok_or_else(|| invalid(field, "object expected"))?;
            create_message(tree, index, object, depth + 1)
                .map(FieldValue::Message)
                .map_err(|inner| format!("{}.{}", field.name(), inner))
        }
    }
}
