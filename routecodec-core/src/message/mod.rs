/*
    message - Dynamic message instances and their payload form

    Payloads travel through three stages on the way to bytes:
    verify (shape check with per-field diagnostics), create (typed
    DynamicMessage) and wire encoding. Decoding runs the reverse, ending in
    a projection back to a payload with defaults filled in.
*/

pub(crate) mod convert;
mod create;
mod descriptor;
mod payload;
mod project;
mod value;
mod verify;

pub use descriptor::MessageDescriptor;
pub use payload::Payload;
pub use value::{DynamicMessage, FieldValue, MapKey};
