//! Bytes to message
//!
//! Unknown fields are skipped. Every structural fault (truncation, length
//! overrun, wire type mismatch, invalid UTF-8, missing required field)
//! becomes an error string for `CodecError::DecodeMalformed`.

use std::collections::BTreeMap;

use bytes::Buf;
use prost::encoding::{decode_key, decode_varint, WireType};

use super::{scalar_wire_type, unzigzag32, unzigzag64, wire_type_of, RECURSION_LIMIT};
use crate::message::{convert, DynamicMessage, FieldValue, MapKey};
use crate::schema::{FieldDescriptor, FieldType, ScalarType, SchemaTree};

/// Decode one complete message of type `index` from `buf`
pub(crate) fn decode_message(
    tree: &SchemaTree,
    index: usize,
    mut buf: &[u8],
    depth: u32,
) -> Result<DynamicMessage, String> {
    if depth > RECURSION_LIMIT {
        return Err("recursion limit exceeded".to_string());
    }

    let message_type = tree.message(index);
    let mut message = DynamicMessage::new(tree.id(), index);
    while !buf.is_empty() {
        let (number, wire_type) = decode_key(&mut buf).map_err(|e| e.to_string())?;
        match message_type.field_by_number(number) {
            Some(field) => decode_field(tree, field, wire_type, &mut buf, &mut message, depth)?,
            None => skip_field(wire_type, number, &mut buf, depth)?,
        }
    }

    if let Some(missing) = message_type
        .fields()
        .iter()
        .find(|f| f.is_required() && !message.has(f.number()))
    {
        return Err(format!("missing required '{}'", missing.name()));
    }
    Ok(message)
}

fn decode_field(
    tree: &SchemaTree,
    field: &FieldDescriptor,
    wire_type: WireType,
    buf: &mut &[u8],
    message: &mut DynamicMessage,
    depth: u32,
) -> Result<(), String> {
    let field_type = field.field_type();

    if let Some(key_type) = field.map_key() {
        expect_wire_type(field, wire_type, WireType::LengthDelimited)?;
        let entry = take_length_delimited(buf)?;
        let (key, value) = decode_map_entry(tree, field, key_type, entry, depth)?;
        match message.entry_mut(field.number()) {
            Some(FieldValue::Map(entries)) => {
                entries.insert(key, value);
            }
            _ => {
                let mut entries = BTreeMap::new();
                entries.insert(key, value);
                message.set(field.number(), FieldValue::Map(entries));
            }
        }
        return Ok(());
    }

    if field.is_repeated() {
        let mut items = Vec::new();
        if wire_type == WireType::LengthDelimited && field_type.is_packable() {
            let mut packed = take_length_delimited(buf)?;
            while !packed.is_empty() {
                items.push(decode_raw(tree, field_type, &mut packed, depth)?);
            }
        } else {
            expect_wire_type(field, wire_type, wire_type_of(field_type))?;
            items.push(decode_raw(tree, field_type, buf, depth)?);
        }
        match message.entry_mut(field.number()) {
            Some(FieldValue::List(existing)) => existing.extend(items),
            _ => message.set(field.number(), FieldValue::List(items)),
        }
        return Ok(());
    }

    expect_wire_type(field, wire_type, wire_type_of(field_type))?;
    let value = decode_raw(tree, field_type, buf, depth)?;
    message.set(field.number(), value);
    Ok(())
}

/// Map entries are nested records with key = 1 and value = 2; a missing
/// half takes its type's default.
fn decode_map_entry(
    tree: &SchemaTree,
    field: &FieldDescriptor,
    key_type: ScalarType,
    mut entry: &[u8],
    depth: u32,
) -> Result<(MapKey, FieldValue), String> {
    let mut key = None;
    let mut value = None;
    while !entry.is_empty() {
        let (number, wire_type) = decode_key(&mut entry).map_err(|e| e.to_string())?;
        match number {
            1 => {
                expect_wire_type(field, wire_type, scalar_wire_type(key_type))?;
                key = Some(decode_scalar(key_type, &mut entry)?);
            }
            2 => {
                expect_wire_type(field, wire_type, wire_type_of(field.field_type()))?;
                value = Some(decode_raw(tree, field.field_type(), &mut entry, depth)?);
            }
            _ => skip_field(wire_type, number, &mut entry, depth)?,
        }
    }

    let key = match key {
        Some(key) => map_key_of(key)?,
        None => convert::zero_key(key_type)
            .ok_or_else(|| format!("{}: invalid map key type", field.name()))?,
    };
    let value = match value {
        Some(value) => value,
        None => default_value(tree, field.field_type()),
    };
    Ok((key, value))
}

fn decode_raw(
    tree: &SchemaTree,
    field_type: FieldType,
    buf: &mut &[u8],
    depth: u32,
) -> Result<FieldValue, String> {
    match field_type {
        FieldType::Scalar(scalar) => decode_scalar(scalar, buf),
        FieldType::Enum(_) => Ok(FieldValue::Enum(varint(buf)? as i32)),
        FieldType::Message(index) => {
            let body = take_length_delimited(buf)?;
            decode_message(tree, index, body, depth + 1).map(FieldValue::Message)
        }
    }
}

fn decode_scalar(scalar: ScalarType, buf: &mut &[u8]) -> Result<FieldValue, String> {
    let value = match scalar {
        ScalarType::Int32 => FieldValue::Int32(varint(buf)? as i32),
        ScalarType::Sint32 => FieldValue::Int32(unzigzag32(varint(buf)? as u32)),
        ScalarType::Sfixed32 => FieldValue::Int32(fixed32(buf)? as i32),
        ScalarType::Uint32 => FieldValue::Uint32(varint(buf)? as u32),
        ScalarType::Fixed32 => FieldValue::Uint32(fixed32(buf)?),
        ScalarType::Int64 => FieldValue::Int64(varint(buf)? as i64),
        ScalarType::Sint64 => FieldValue::Int64(unzigzag64(varint(buf)?)),
        ScalarType::Sfixed64 => FieldValue::Int64(fixed64(buf)? as i64),
        ScalarType::Uint64 => FieldValue::Uint64(varint(buf)?),
        ScalarType::Fixed64 => FieldValue::Uint64(fixed64(buf)?),
        ScalarType::Float => FieldValue::Float(f32::from_bits(fixed32(buf)?)),
        ScalarType::Double => FieldValue::Double(f64::from_bits(fixed64(buf)?)),
        ScalarType::Bool => FieldValue::Bool(varint(buf)? != 0),
        ScalarType::String => {
            let raw = take_length_delimited(buf)?;
            let text = std::str::from_utf8(raw).map_err(|_| "invalid UTF-8 in string field")?;
            FieldValue::String(text.to_string())
        }
        ScalarType::Bytes => FieldValue::Bytes(take_length_delimited(buf)?.to_vec()),
    };
    Ok(value)
}

fn skip_field(wire_type: WireType, number: u32, buf: &mut &[u8], depth: u32) -> Result<(), String> {
    match wire_type {
        WireType::Varint => {
            varint(buf)?;
        }
        WireType::ThirtyTwoBit => advance(buf, 4)?,
        WireType::SixtyFourBit => advance(buf, 8)?,
        WireType::LengthDelimited => {
            take_length_delimited(buf)?;
        }
        WireType::StartGroup => {
            if depth >= RECURSION_LIMIT {
                return Err("recursion limit exceeded".to_string());
            }
            loop {
                if buf.is_empty() {
                    return Err(format!("unterminated group {}", number));
                }
                let (inner, inner_type) = decode_key(buf).map_err(|e| e.to_string())?;
                if inner_type == WireType::EndGroup {
                    if inner != number {
                        return Err(format!("mismatched end group tag {}", inner));
                    }
                    break;
                }
                skip_field(inner_type, inner, buf, depth + 1)?;
            }
        }
        WireType::EndGroup => return Err(format!("unexpected end group tag {}", number)),
    }
    Ok(())
}

fn expect_wire_type(
    field: &FieldDescriptor,
    actual: WireType,
    expected: WireType,
) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!(
            "{}: wire type {:?} does not match declared {:?}",
            field.name(),
            actual,
            expected
        ))
    }
}

fn take_length_delimited<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], String> {
    let len = varint(buf)?;
    let data: &'a [u8] = *buf;
    if len > data.len() as u64 {
        return Err(format!("length {} exceeds remaining {} bytes", len, data.len()));
    }
    let (head, tail) = data.split_at(len as usize);
    *buf = tail;
    Ok(head)
}

fn advance(buf: &mut &[u8], n: usize) -> Result<(), String> {
    if buf.remaining() < n {
        return Err("buffer underflow".to_string());
    }
    buf.advance(n);
    Ok(())
}

fn varint(buf: &mut &[u8]) -> Result<u64, String> {
    decode_varint(buf).map_err(|e| e.to_string())
}

fn fixed32(buf: &mut &[u8]) -> Result<u32, String> {
    if buf.remaining() < 4 {
        return Err("buffer underflow".to_string());
    }
    Ok(buf.get_u32_le())
}

fn fixed64(buf: &mut &[u8]) -> Result<u64, String> {
    if buf.remaining() < 8 {
        return Err("buffer underflow".to_string());
    }
    Ok(buf.get_u64_le())
}

fn map_key_of(value: FieldValue) -> Result<MapKey, String> {
    match value {
        FieldValue::Int32(v) => Ok(MapKey::Int32(v)),
        FieldValue::Int64(v) => Ok(MapKey::Int64(v)),
        FieldValue::Uint32(v) => Ok(MapKey::Uint32(v)),
        FieldValue::Uint64(v) => Ok(MapKey::Uint64(v)),
        FieldValue::Bool(v) => Ok(MapKey::Bool(v)),
        FieldValue::String(v) => Ok(MapKey::String(v)),
        _ => Err("invalid map key".to_string()),
    }
}

fn default_value(tree: &SchemaTree, field_type: FieldType) -> FieldValue {
    match field_type {
        FieldType::Scalar(scalar) => convert::zero_value(scalar),
        FieldType::Enum(index) => FieldValue::Enum(tree.enum_type(index).default_value()),
        FieldType::Message(index) => FieldValue::Message(DynamicMessage::new(tree.id(), index)),
    }
}
