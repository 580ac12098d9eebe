//! Conversions between JSON values and typed field values
//!
//! Error strings are the verifier's diagnostics and end up verbatim in
//! `CodecError::PayloadInvalid`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Number, Value};

use super::value::{FieldValue, MapKey};
use crate::schema::{EnumType, ScalarType};

const INTEGER_EXPECTED: &str = "integer expected";
const LONG_EXPECTED: &str = "integer|Long expected";

/// Convert a JSON value into a scalar field value
pub(crate) fn scalar_from_json(scalar: ScalarType, value: &Value) -> Result<FieldValue, &'static str> {
    match scalar {
        ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => as_integer(value)
            .and_then(|v| i32::try_from(v).ok())
            .map(FieldValue::Int32)
            .ok_or(INTEGER_EXPECTED),
        ScalarType::Uint32 | ScalarType::Fixed32 => as_integer(value)
            .and_then(|v| u32::try_from(v).ok())
            .map(FieldValue::Uint32)
            .ok_or(INTEGER_EXPECTED),
        ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => as_long(value)
            .and_then(|v| i64::try_from(v).ok())
            .map(FieldValue::Int64)
            .ok_or(LONG_EXPECTED),
        ScalarType::Uint64 | ScalarType::Fixed64 => as_long(value)
            .and_then(|v| u64::try_from(v).ok())
            .map(FieldValue::Uint64)
            .ok_or(LONG_EXPECTED),
        ScalarType::Float => {
            as_number(value).map(|v| FieldValue::Float(v as f32)).ok_or("number expected")
        }
        ScalarType::Double => as_number(value).map(FieldValue::Double).ok_or("number expected"),
        ScalarType::Bool => value.as_bool().map(FieldValue::Bool).ok_or("boolean expected"),
        ScalarType::String => value
            .as_str()
            .map(|s| FieldValue::String(s.to_string()))
            .ok_or("string expected"),
        ScalarType::Bytes => as_bytes(value).map(FieldValue::Bytes).ok_or("buffer expected"),
    }
}

/// Convert a JSON value (number or value name) into a defined enum number
pub(crate) fn enum_from_json(enum_type: &EnumType, value: &Value) -> Result<i32, &'static str> {
    let number = match value {
        Value::String(name) => enum_type.value_of(name),
        _ => as_integer(value)
            .and_then(|v| i32::try_from(v).ok())
            .filter(|v| enum_type.contains(*v)),
    };
    number.ok_or("enum value expected")
}

/// Parse a JSON object key into a map key of the declared type
pub(crate) fn map_key_from_str(scalar: ScalarType, key: &str) -> Result<MapKey, &'static str> {
    match scalar {
        ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => {
            key.parse().map(MapKey::Int32).map_err(|_| "integer key expected")
        }
        ScalarType::Uint32 | ScalarType::Fixed32 => {
            key.parse().map(MapKey::Uint32).map_err(|_| "integer key expected")
        }
        ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => {
            key.parse().map(MapKey::Int64).map_err(|_| "integer|Long key expected")
        }
        ScalarType::Uint64 | ScalarType::Fixed64 => {
            key.parse().map(MapKey::Uint64).map_err(|_| "integer|Long key expected")
        }
        ScalarType::Bool => match key {
            "true" => Ok(MapKey::Bool(true)),
            "false" => Ok(MapKey::Bool(false)),
            _ => Err("boolean key expected"),
        },
        ScalarType::String => Ok(MapKey::String(key.to_string())),
        ScalarType::Double | ScalarType::Float | ScalarType::Bytes => Err("invalid map key type"),
    }
}

/// Zero value of a scalar type
pub(crate) fn zero_value(scalar: ScalarType) -> FieldValue {
    match scalar {
        ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => FieldValue::Int32(0),
        ScalarType::Uint32 | ScalarType::Fixed32 => FieldValue::Uint32(0),
        ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => FieldValue::Int64(0),
        ScalarType::Uint64 | ScalarType::Fixed64 => FieldValue::Uint64(0),
        ScalarType::Float => FieldValue::Float(0.0),
        ScalarType::Double => FieldValue::Double(0.0),
        ScalarType::Bool => FieldValue::Bool(false),
        ScalarType::String => FieldValue::String(String::new()),
        ScalarType::Bytes => FieldValue::Bytes(Vec::new()),
    }
}

/// Zero key of a map key type
pub(crate) fn zero_key(scalar: ScalarType) -> Option<MapKey> {
    match zero_value(scalar) {
        FieldValue::Int32(v) => Some(MapKey::Int32(v)),
        FieldValue::Uint32(v) => Some(MapKey::Uint32(v)),
        FieldValue::Int64(v) => Some(MapKey::Int64(v)),
        FieldValue::Uint64(v) => Some(MapKey::Uint64(v)),
        FieldValue::Bool(v) => Some(MapKey::Bool(v)),
        FieldValue::String(v) => Some(MapKey::String(v)),
        _ => None,
    }
}

/// Render a scalar or enum value as JSON
///
/// Bytes become standard base64, non-finite floats become `"NaN"`,
/// `"Infinity"` or `"-Infinity"`. Composite values render as null; the
/// projection handles them.
pub(crate) fn scalar_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Int32(v) | FieldValue::Enum(v) => Value::from(*v),
        FieldValue::Int64(v) => Value::from(*v),
        FieldValue::Uint32(v) => Value::from(*v),
        FieldValue::Uint64(v) => Value::from(*v),
        FieldValue::Float(v) => float_to_json(f64::from(*v)),
        FieldValue::Double(v) => float_to_json(*v),
        FieldValue::Bool(v) => Value::Bool(*v),
        FieldValue::String(v) => Value::String(v.clone()),
        FieldValue::Bytes(v) => Value::String(STANDARD.encode(v)),
        FieldValue::Message(_) | FieldValue::List(_) | FieldValue::Map(_) => Value::Null,
    }
}

fn float_to_json(v: f64) -> Value {
    if v.is_nan() {
        Value::String("NaN".to_string())
    } else if v.is_infinite() {
        let text = if v > 0.0 { "Infinity" } else { "-Infinity" };
        Value::String(text.to_string())
    } else {
        Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn as_integer(value: &Value) -> Option<i128> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(v) = n.as_i64() {
        return Some(i128::from(v));
    }
    if let Some(v) = n.as_u64() {
        return Some(i128::from(v));
    }
    // integral floats such as 2.0 are accepted
    n.as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 1.9e19)
        .map(|f| f as i128)
}

fn as_long(value: &Value) -> Option<i128> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        _ => as_integer(value),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        _ => None,
    }
}

fn as_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::String(s) => STANDARD.decode(s).ok(),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect(),
        _ => None,
    }
}
