//! Route-addressed binary message codec
//!
//! Converts structured payloads to and from compact, field-tagged binary
//! messages described by JSON schema definitions. Messages are addressed by
//! dotted route names (`chat.Message`); outbound and inbound traffic use
//! separate schemas.
//!
//! ```
//! use routecodec_core::{Codec, Payload, SchemaDefinition};
//! use serde_json::json;
//!
//! let schema = SchemaDefinition::new(json!({
//!     "nested": { "chat": { "nested": { "Message": { "fields": {
//!         "from": { "type": "int32", "id": 1 },
//!         "content": { "type": "string", "id": 3 }
//!     } } } } }
//! }));
//! let codec = Codec::new(schema.clone(), schema).unwrap();
//!
//! let payload = Payload::try_from(json!({ "from": 1, "content": "hi" })).unwrap();
//! let bytes = codec.encode("chat.Message", &payload).unwrap();
//! assert_eq!(codec.decode("chat.Message", &bytes).unwrap(), payload);
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod metrics;
pub mod registry;
pub mod route;
pub mod schema;
pub mod text;

mod wire;

pub use codec::Codec;
pub use config::{CodecConfig, ConfigError};
pub use error::{CodecError, CodecResult};
pub use logging::{init_logging, LogLevel};
pub use message::{DynamicMessage, FieldValue, MapKey, MessageDescriptor, Payload};
pub use registry::{SchemaRegistry, Side};
pub use route::normalize_route;
pub use schema::{SchemaDefinition, SchemaTree};
pub use text::TextEncoding;
