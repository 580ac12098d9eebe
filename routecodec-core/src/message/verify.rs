//! Payload shape verification
//!
//! Diagnostics name the offending field (`content: string expected`),
//! prefix nested failures with the parent field (`meta.id: integer expected`)
//! and mark repeated and map element failures with `[]` or `{k:<key type>}`.

use serde_json::{Map, Value};

use super::convert;
use crate::schema::{FieldDescriptor, FieldType, SchemaTree};
use crate::wire::RECURSION_LIMIT;

/// Check `object` against message type `index`, returning the first fault
pub(crate) fn verify_message(
    tree: &SchemaTree,
    index: usize,
    object: &Map<String, Value>,
    depth: u32,
) -> Result<(), String> {
    if depth > RECURSION_LIMIT {
        return Err("max depth exceeded".to_string());
    }

    let message_type = tree.message(index);
    let mut oneof_seen = vec![false; message_type.oneofs().len()];
    for field in message_type.fields() {
        let value = match object.get(field.name()) {
            None | Some(Value::Null) => {
                if field.is_required() {
                    return Err(format!("missing required '{}'", field.name()));
                }
                continue;
            }
            Some(value) => value,
        };

        if let Some(oneof) = field.oneof() {
            if std::mem::replace(&mut oneof_seen[oneof], true) {
                return Err(format!("{}: multiple values", message_type.oneofs()[oneof].name()));
            }
        }
        verify_field(tree, field, value, depth)?;
    }
    Ok(())
}

fn verify_field(
    tree: &SchemaTree,
    field: &FieldDescriptor,
    value: &Value,
    depth: u32,
) -> Result<(), String> {
    if let Some(key_type) = field.map_key() {
        let entries =
            value.as_object().ok_or_else(|| format!("{}: object expected", field.name()))?;
        for (key, entry) in entries {
            convert::map_key_from_str(key_type, key).map_err(|reason| invalid(field, reason))?;
            verify_value(tree, field, entry, depth)?;
        }
        return Ok(());
    }

    if field.is_repeated() {
        let items = value.as_array().ok_or_else(|| format!("{}: array expected", field.name()))?;
        return items.iter().try_for_each(|item| verify_value(tree, field, item, depth));
    }

    verify_value(tree, field, value, depth)
}

fn verify_value(
    tree: &SchemaTree,
    field: &FieldDescriptor,
    value: &Value,
    depth: u32,
) -> Result<(), String> {
    match field.field_type() {
        FieldType::Scalar(scalar) => convert::scalar_from_json(scalar, value)
            .map(drop)
            .map_err(|reason| invalid(field, reason)),
        FieldType::Enum(index) => convert::enum_from_json(tree.enum_type(index), value)
            .map(drop)
            .map_err(|reason| invalid(field, reason)),
        FieldType::Message(index) => {
            let object = value.as_object().ok_or_else(|| invalid(field, "object expected"))?;
            verify_message(tree, index, object, depth + 1)
                .map_err(|inner| format!("{}.{}", field.name(), inner))
        }
    }
}

/// `<field>: <what>[] expected` for repeated, `<what>{k:<key>}` for maps
pub(super) fn invalid(field: &FieldDescriptor, reason: &str) -> String {
    let what = reason.strip_suffix(" expected").unwrap_or(reason);
    let suffix = match field.map_key() {
        Some(key_type) => format!("{{k:{}}}", key_type.name()),
        None if field.is_repeated() => "[]".to_string(),
        None => String::new(),
    };
    format!("{}: {}{} expected", field.name(), what, suffix)
}
