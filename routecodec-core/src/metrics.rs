//! Codec metrics
//!
//! Recorded through the `metrics` facade; without an installed recorder
//! every call is a no-op. Failure counters carry a `kind` label with the
//! error kind.

use metrics::{counter, describe_counter, describe_histogram, histogram};

use crate::error::CodecResult;
use crate::message::Payload;
use crate::registry::Side;

pub const ENCODE_TOTAL: &str = "codec.encode.total";
pub const ENCODE_FAILED: &str = "codec.encode.failed";
pub const ENCODE_BYTES: &str = "codec.encode.bytes";
pub const DECODE_TOTAL: &str = "codec.decode.total";
pub const DECODE_FAILED: &str = "codec.decode.failed";
pub const DECODE_BYTES: &str = "codec.decode.bytes";
pub const SCHEMA_RELOADS: &str = "codec.schema.reloads";

/// Initialize metrics with descriptions
pub fn init_metrics() {
    describe_counter!(ENCODE_TOTAL, "Total encode calls");
    describe_counter!(ENCODE_FAILED, "Failed encode calls, by error kind");
    describe_histogram!(ENCODE_BYTES, "Size of encoded messages in bytes");

    describe_counter!(DECODE_TOTAL, "Total decode calls");
    describe_counter!(DECODE_FAILED, "Failed decode calls, by error kind");
    describe_histogram!(DECODE_BYTES, "Size of decoded input in bytes");

    describe_counter!(SCHEMA_RELOADS, "Successful schema loads, by side");
}

pub(crate) fn record_encode(result: &CodecResult<Vec<u8>>) {
    counter!(ENCODE_TOTAL).increment(1);
    match result {
        Ok(bytes) => histogram!(ENCODE_BYTES).record(bytes.len() as f64),
        Err(err) => counter!(ENCODE_FAILED, "kind" => err.kind()).increment(1),
    }
}

pub(crate) fn record_decode(input_len: usize, result: &CodecResult<Payload>) {
    counter!(DECODE_TOTAL).increment(1);
    match result {
        Ok(_) => histogram!(DECODE_BYTES).record(input_len as f64),
        Err(err) => counter!(DECODE_FAILED, "kind" => err.kind()).increment(1),
    }
}

pub(crate) fn record_reload(side: Side) {
    counter!(SCHEMA_RELOADS, "side" => side.as_str()).increment(1);
}
