/*
    wire - Binary wire format for dynamic messages

    Field-tagged records: every field is a key (field number << 3 | wire
    type) followed by its value. Varint, length-delimited, 32-bit and 64-bit
    values follow the standard protobuf layout; key and varint primitives
    come from `prost::encoding`.

    One message is exactly one byte sequence. No length prefix or envelope
    is added around the outermost message.
*/

use prost::encoding::WireType;

use crate::schema::{FieldType, ScalarType};

mod decode;
mod encode;

pub(crate) use decode::decode_message;
pub(crate) use encode::encode_message;

/// Maximum nesting depth of messages, on the wire and in payloads
pub(crate) const RECURSION_LIMIT: u32 = 100;

pub(crate) fn scalar_wire_type(scalar: ScalarType) -> WireType {
    match scalar {
        ScalarType::Int32
        | ScalarType::Uint32
        | ScalarType::Sint32
        | ScalarType::Int64
        | ScalarType::Uint64
        | ScalarType::Sint64
        | ScalarType::Bool => WireType::Varint,
        ScalarType::Fixed32 | ScalarType::Sfixed32 | ScalarType::Float => WireType::ThirtyTwoBit,
        ScalarType::Fixed64 | ScalarType::Sfixed64 | ScalarType::Double => WireType::SixtyFourBit,
        ScalarType::String | ScalarType::Bytes => WireType::LengthDelimited,
    }
}

pub(crate) fn wire_type_of(field_type: FieldType) -> WireType {
    match field_type {
        FieldType::Scalar(scalar) => scalar_wire_type(scalar),
        FieldType::Enum(_) => WireType::Varint,
        FieldType::Message(_) => WireType::LengthDelimited,
    }
}

fn zigzag32(v: i32) -> u32 {
    ((v << 1) ^ (v >> 31)) as u32
}

fn unzigzag32(v: u32) -> i32 {
    ((v >> 1) as i32) ^ -((v & 1) as i32)
}

fn zigzag64(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

fn unzigzag64(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}
