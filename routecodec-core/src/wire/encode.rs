//! Message to bytes

use bytes::BufMut;
use prost::encoding::{encode_key, encode_varint, WireType};

use super::{scalar_wire_type, wire_type_of, zigzag32, zigzag64};
use crate::message::{DynamicMessage, FieldValue, MapKey};
use crate::schema::{FieldDescriptor, FieldType, ScalarType, SchemaTree};

/// Append the wire form of `message` to `buf`
///
/// Fields are written in ascending field-number order.
pub(crate) fn encode_message(
    tree: &SchemaTree,
    message: &DynamicMessage,
    buf: &mut Vec<u8>,
) -> Result<(), String> {
    let message_type = tree.message(message.type_index());
    for (number, value) in message.fields() {
        let field = message_type
            .field_by_number(number)
            .ok_or_else(|| format!("unknown field number {}", number))?;
        encode_field(tree, field, value, buf)?;
    }
    Ok(())
}

fn encode_field(
    tree: &SchemaTree,
    field: &FieldDescriptor,
    value: &FieldValue,
    buf: &mut Vec<u8>,
) -> Result<(), String> {
    match value {
        FieldValue::Map(entries) => {
            let key_type = field
                .map_key()
                .ok_or_else(|| format!("{}: map value on a non-map field", field.name()))?;
            for (key, entry) in entries {
                let mut body = Vec::new();
                encode_key(1, scalar_wire_type(key_type), &mut body);
                encode_scalar(key_type, &key_value(key), &mut body)?;
                encode_single(tree, 2, field.field_type(), entry, &mut body)?;
                write_length_delimited(field.number(), &body, buf);
            }
        }
        FieldValue::List(items) if field.is_packed() => {
            if items.is_empty() {
                return Ok(());
            }
            let mut body = Vec::new();
            for item in items {
                encode_raw(tree, field.field_type(), item, &mut body)?;
            }
            write_length_delimited(field.number(), &body, buf);
        }
        FieldValue::List(items) => {
            for item in items {
                encode_single(tree, field.number(), field.field_type(), item, buf)?;
            }
        }
        single => encode_single(tree, field.number(), field.field_type(), single, buf)?,
    }
    Ok(())
}

fn encode_single(
    tree: &SchemaTree,
    number: u32,
    field_type: FieldType,
    value: &FieldValue,
    buf: &mut Vec<u8>,
) -> Result<(), String> {
    encode_key(number, wire_type_of(field_type), buf);
    encode_raw(tree, field_type, value, buf)
}

/// Value without its key
fn encode_raw(
    tree: &SchemaTree,
    field_type: FieldType,
    value: &FieldValue,
    buf: &mut Vec<u8>,
) -> Result<(), String> {
    match (field_type, value) {
        (FieldType::Scalar(scalar), value) => encode_scalar(scalar, value, buf),
        (FieldType::Enum(_), FieldValue::Enum(v)) => {
            encode_varint(*v as i64 as u64, buf);
            Ok(())
        }
        (FieldType::Message(_), FieldValue::Message(nested)) => {
            let mut body = Vec::new();
            encode_message(tree, nested, &mut body)?;
            encode_varint(body.len() as u64, buf);
            buf.put_slice(&body);
            Ok(())
        }
        _ => Err("value does not match the declared field type".to_string()),
    }
}

fn encode_scalar(scalar: ScalarType, value: &FieldValue, buf: &mut Vec<u8>) -> Result<(), String> {
    match (scalar, value) {
        (ScalarType::Int32, FieldValue::Int32(v)) => encode_varint(*v as i64 as u64, buf),
        (ScalarType::Sint32, FieldValue::Int32(v)) => encode_varint(u64::from(zigzag32(*v)), buf),
        (ScalarType::Sfixed32, FieldValue::Int32(v)) => buf.put_i32_le(*v),
        (ScalarType::Uint32, FieldValue::Uint32(v)) => encode_varint(u64::from(*v), buf),
        (ScalarType::Fixed32, FieldValue::Uint32(v)) => buf.put_u32_le(*v),
        (ScalarType::Int64, FieldValue::Int64(v)) => encode_varint(*v as u64, buf),
        (ScalarType::Sint64, FieldValue::Int64(v)) => encode_varint(zigzag64(*v), buf),
        (ScalarType::Sfixed64, FieldValue::Int64(v)) => buf.put_i64_le(*v),
        (ScalarType::Uint64, FieldValue::Uint64(v)) => encode_varint(*v, buf),
        (ScalarType::Fixed64, FieldValue::Uint64(v)) => buf.put_u64_le(*v),
        (ScalarType::Float, FieldValue::Float(v)) => buf.put_f32_le(*v),
        (ScalarType::Double, FieldValue::Double(v)) => buf.put_f64_le(*v),
        (ScalarType::Bool, FieldValue::Bool(v)) => encode_varint(u64::from(*v), buf),
        (ScalarType::String, FieldValue::String(v)) => {
            encode_varint(v.len() as u64, buf);
            buf.put_slice(v.as_bytes());
        }
        (ScalarType::Bytes, FieldValue::Bytes(v)) => {
            encode_varint(v.len() as u64, buf);
            buf.put_slice(v);
        }
        _ => return Err(format!("value does not match {}", scalar.name())),
    }
    Ok(())
}

fn write_length_delimited(number: u32, body: &[u8], buf: &mut Vec<u8>) {
    encode_key(number, WireType::LengthDelimited, buf);
    encode_varint(body.len() as u64, buf);
    buf.put_slice(body);
}

fn key_value(key: &MapKey) -> FieldValue {
    match key {
        MapKey::Int32(v) => FieldValue::Int32(*v),
        MapKey::Int64(v) => FieldValue::Int64(*v),
        MapKey::Uint32(v) => FieldValue::Uint32(*v),
        MapKey::Uint64(v) => FieldValue::Uint64(*v),
        MapKey::Bool(v) => FieldValue::Bool(*v),
        MapKey::String(v) => FieldValue::String(v.clone()),
    }
}
