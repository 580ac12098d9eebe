/*
    schema - Schema definitions and the lookup trees built from them

    A SchemaDefinition is the raw JSON descriptor document (namespaces with
    nested message and enum definitions). A SchemaTree is the resolved,
    immutable form used for route lookup and encoding.
*/

pub mod definition;
pub mod tree;
pub mod types;

// Re-export commonly used types
pub use definition::SchemaDefinition;
pub use tree::SchemaTree;
pub use types::{
    EnumType, FieldDescriptor, FieldRule, FieldType, MessageType, OneofDescriptor, ScalarType,
};
