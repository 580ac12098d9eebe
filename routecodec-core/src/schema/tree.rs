/*
    tree.rs - Immutable schema lookup tree

    Built once from a SchemaDefinition in two passes:

    1. Walk the namespace graph. Every message and enum gets an index and a
       fully qualified dotted name; fields are collected unresolved.
    2. Resolve field type references (absolute when prefixed with `.`,
       otherwise relative to the declaring message, walking outward to the
       root), convert declared defaults, attach oneofs.

    Lookup is hierarchical: each dotted segment descends one level into the
    namespace tree, so `a.b.C` resolves if namespace `a` contains `b` which
    contains the message type `C`. A relative route that does not resolve
    from the root is then tried inside each nested namespace, depth first in
    declaration order, so `Message` finds `chat.Message`. A leading `.`
    disables that search.
*/

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::definition::SchemaDefinition;
use super::types::{
    EnumType, FieldDescriptor, FieldRule, FieldType, MessageType, OneofDescriptor, ScalarType,
};
use crate::error::{CodecError, CodecResult};
use crate::message::{convert, FieldValue};

/// Largest field number allowed by the wire format
const MAX_FIELD_NUMBER: u64 = 536_870_911;

/// Field numbers reserved by the wire format implementation
const RESERVED_FIELD_NUMBERS: std::ops::RangeInclusive<u64> = 19_000..=19_999;

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Immutable tree of message and enum types
#[derive(Debug)]
pub struct SchemaTree {
    id: u64,
    root: Namespace,
    messages: Vec<MessageType>,
    enums: Vec<EnumType>,
}

#[derive(Debug, Default)]
struct Namespace {
    nested: HashMap<String, Node>,
    /// Child names in declaration order
    order: Vec<String>,
}

impl Namespace {
    fn insert(&mut self, name: String, node: Node) {
        self.order.push(name.clone());
        self.nested.insert(name, node);
    }

    fn resolve_path(&self, segments: &[&str]) -> Option<&Node> {
        let (first, rest) = segments.split_first()?;
        let node = self.nested.get(*first)?;
        if rest.is_empty() {
            return Some(node);
        }
        node.children()?.resolve_path(rest)
    }

    fn search<T>(&self, segments: &[&str], pick: &impl Fn(&Node) -> Option<T>) -> Option<T> {
        if let Some(found) = self.resolve_path(segments).and_then(pick) {
            return Some(found);
        }
        self.order
            .iter()
            .filter_map(|name| self.nested.get(name)?.children())
            .find_map(|child| child.search(segments, pick))
    }
}

#[derive(Debug)]
enum Node {
    Namespace(Namespace),
    Message { index: usize, nested: Namespace },
    Enum(usize),
}

impl Node {
    fn children(&self) -> Option<&Namespace> {
        match self {
            Node::Namespace(ns) => Some(ns),
            Node::Message { nested, .. } => Some(nested),
            Node::Enum(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TypeRef {
    Message(usize),
    Enum(usize),
}

impl SchemaTree {
    /// Build a tree from a definition
    pub fn build(definition: &SchemaDefinition) -> CodecResult<Self> {
        let root = definition
            .as_value()
            .as_object()
            .ok_or_else(|| CodecError::schema("$", "object expected"))?;

        let mut builder = TreeBuilder::default();
        let root = builder.namespace(root, "")?;
        builder.resolve()?;

        Ok(SchemaTree {
            id: NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed),
            root,
            messages: builder.messages,
            enums: builder.enums,
        })
    }

    /// Process-unique identity of this tree
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Resolve a dotted route to a message type index
    ///
    /// A single leading `.` (fully qualified form) is accepted and skips the
    /// nested namespace search. Routes that name a namespace or an enum do
    /// not resolve.
    pub(crate) fn lookup(&self, route: &str) -> Option<usize> {
        self.find(route, &|node: &Node| match node {
            Node::Message { index, .. } => Some(*index),
            _ => None,
        })
    }

    /// Resolve a dotted name to an enum type, with the same rules as routes
    pub fn lookup_enum(&self, name: &str) -> Option<&EnumType> {
        self.find(name, &|node: &Node| match node {
            Node::Enum(index) => Some(*index),
            _ => None,
        })
        .map(|index| &self.enums[index])
    }

    fn find(&self, route: &str, pick: &impl Fn(&Node) -> Option<usize>) -> Option<usize> {
        let (absolute, path) = match route.strip_prefix('.') {
            Some(path) => (true, path),
            None => (false, route),
        };
        if path.is_empty() {
            return None;
        }

        let segments: Vec<&str> = path.split('.').collect();
        if absolute {
            self.root.resolve_path(&segments).and_then(pick)
        } else {
            self.root.search(&segments, pick)
        }
    }

    /// Resolve a dotted route to a message type
    pub fn lookup_message(&self, route: &str) -> Option<&MessageType> {
        self.lookup(route).map(|index| &self.messages[index])
    }

    pub fn message(&self, index: usize) -> &MessageType {
        &self.messages[index]
    }

    pub fn enum_type(&self, index: usize) -> &EnumType {
        &self.enums[index]
    }

    /// Fully qualified names of all message types, in definition order
    pub fn message_names(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(MessageType::full_name)
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// A field whose type reference is not resolved yet
struct PendingField {
    message: usize,
    name: String,
    number: u32,
    rule: FieldRule,
    type_name: String,
    key_type: Option<String>,
    packed: Option<bool>,
    default: Option<Value>,
}

struct PendingOneof {
    message: usize,
    name: String,
    members: Vec<String>,
}

#[derive(Default)]
struct TreeBuilder {
    messages: Vec<MessageType>,
    enums: Vec<EnumType>,
    names: HashMap<String, TypeRef>,
    fields: Vec<PendingField>,
    oneofs: Vec<PendingOneof>,
}

impl TreeBuilder {
    fn namespace(&mut self, obj: &Map<String, Value>, prefix: &str) -> CodecResult<Namespace> {
        let mut ns = Namespace::default();
        let Some(nested) = obj.get("nested") else {
            return Ok(ns);
        };
        let nested = nested
            .as_object()
            .ok_or_else(|| CodecError::schema(path_or_root(prefix), "nested: object expected"))?;

        for (name, node) in nested {
            let full_name = qualify(prefix, name);
            if name.is_empty() || name.contains('.') {
                return Err(CodecError::schema(full_name, "invalid name"));
            }
            let node_obj = node
                .as_object()
                .ok_or_else(|| CodecError::schema(&full_name, "object expected"))?;

            let node = if node_obj.contains_key("fields") {
                self.message(name, &full_name, node_obj)?
            } else if node_obj.contains_key("values") {
                Node::Enum(self.enumeration(&full_name, node_obj)?)
            } else if node_obj.contains_key("methods") {
                // services describe no message shape
                continue;
            } else {
                Node::Namespace(self.namespace(node_obj, &full_name)?)
            };
            ns.insert(name.clone(), node);
        }

        Ok(ns)
    }

    fn message(
        &mut self,
        name: &str,
        full_name: &str,
        obj: &Map<String, Value>,
    ) -> CodecResult<Node> {
        let index = self.messages.len();
        self.messages.push(MessageType::new(name, full_name));
        self.names.insert(full_name.to_string(), TypeRef::Message(index));

        let fields = obj
            .get("fields")
            .and_then(Value::as_object)
            .ok_or_else(|| CodecError::schema(full_name, "fields: object expected"))?;
        for (field_name, raw) in fields {
            let field = parse_field(index, field_name, raw, &qualify(full_name, field_name))?;
            self.fields.push(field);
        }

        if let Some(oneofs) = obj.get("oneofs") {
            let oneofs = oneofs
                .as_object()
                .ok_or_else(|| CodecError::schema(full_name, "oneofs: object expected"))?;
            for (oneof_name, raw) in oneofs {
                let path = qualify(full_name, oneof_name);
                let members = raw
                    .get("oneof")
                    .and_then(Value::as_array)
                    .ok_or_else(|| CodecError::schema(&path, "oneof: array expected"))?
                    .iter()
                    .map(|m| {
                        m.as_str()
                            .map(str::to_string)
                            .ok_or_else(|| CodecError::schema(&path, "oneof member: string expected"))
                    })
                    .collect::<CodecResult<Vec<_>>>()?;
                self.oneofs.push(PendingOneof { message: index, name: oneof_name.clone(), members });
            }
        }

        let nested = self.namespace(obj, full_name)?;
        Ok(Node::Message { index, nested })
    }

    fn enumeration(&mut self, full_name: &str, obj: &Map<String, Value>) -> CodecResult<usize> {
        let values = obj
            .get("values")
            .and_then(Value::as_object)
            .ok_or_else(|| CodecError::schema(full_name, "values: object expected"))?;

        let mut parsed = Vec::with_capacity(values.len());
        for (name, value) in values {
            let number = value
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| {
                    CodecError::schema(qualify(full_name, name), "enum value must be an int32")
                })?;
            parsed.push((name.clone(), number));
        }

        let index = self.enums.len();
        self.enums.push(EnumType { full_name: full_name.to_string(), values: parsed });
        self.names.insert(full_name.to_string(), TypeRef::Enum(index));
        Ok(index)
    }

    fn resolve(&mut self) -> CodecResult<()> {
        for pending in std::mem::take(&mut self.fields) {
            let path = qualify(self.messages[pending.message].full_name(), &pending.name);
            let field = self.resolve_field(&pending, &path)?;
            if !self.messages[pending.message].push_field(field) {
                return Err(CodecError::schema(
                    path,
                    format!("duplicate field id {}", pending.number),
                ));
            }
        }

        for pending in std::mem::take(&mut self.oneofs) {
            let message = &mut self.messages[pending.message];
            let path = qualify(message.full_name(), &pending.name);
            let mut fields = Vec::with_capacity(pending.members.len());
            for member in &pending.members {
                let index = message.field_index(member).ok_or_else(|| {
                    CodecError::schema(&path, format!("unknown oneof member '{}'", member))
                })?;
                let field = &message.fields()[index];
                if field.is_repeated() || field.is_map() || field.oneof().is_some() {
                    return Err(CodecError::schema(
                        &path,
                        format!("field '{}' cannot be a oneof member", member),
                    ));
                }
                fields.push(index);
            }
            message.push_oneof(OneofDescriptor { name: pending.name, fields });
        }

        Ok(())
    }

    fn resolve_field(&self, pending: &PendingField, path: &str) -> CodecResult<FieldDescriptor> {
        let field_type = match ScalarType::from_name(&pending.type_name) {
            Some(scalar) => FieldType::Scalar(scalar),
            None => {
                let scope = self.messages[pending.message].full_name();
                match self.resolve_type_name(scope, &pending.type_name) {
                    Some(TypeRef::Message(index)) => FieldType::Message(index),
                    Some(TypeRef::Enum(index)) => FieldType::Enum(index),
                    None => {
                        return Err(CodecError::schema(
                            path,
                            format!("unresolvable type '{}'", pending.type_name),
                        ))
                    }
                }
            }
        };

        let map_key = match &pending.key_type {
            None => None,
            Some(key_type) => {
                let key = ScalarType::from_name(key_type)
                    .filter(ScalarType::is_valid_map_key)
                    .ok_or_else(|| {
                        CodecError::schema(path, format!("invalid map key type '{}'", key_type))
                    })?;
                if pending.rule != FieldRule::Optional {
                    return Err(CodecError::schema(path, "map fields cannot declare a rule"));
                }
                Some(key)
            }
        };

        let repeated = pending.rule == FieldRule::Repeated;
        let packed = repeated && field_type.is_packable() && pending.packed.unwrap_or(true);

        let default = match &pending.default {
            None => None,
            Some(_) if repeated || map_key.is_some() => {
                return Err(CodecError::schema(path, "repeated fields cannot declare a default"))
            }
            Some(value) => Some(self.convert_default(field_type, value, path)?),
        };

        Ok(FieldDescriptor {
            name: pending.name.clone(),
            number: pending.number,
            rule: pending.rule,
            field_type,
            map_key,
            packed,
            default,
            oneof: None,
        })
    }

    fn convert_default(
        &self,
        field_type: FieldType,
        value: &Value,
        path: &str,
    ) -> CodecResult<FieldValue> {
        let converted = match field_type {
            FieldType::Scalar(scalar) => convert::scalar_from_json(scalar, value),
            FieldType::Enum(index) => {
                convert::enum_from_json(&self.enums[index], value).map(FieldValue::Enum)
            }
            FieldType::Message(_) => Err("message fields cannot declare a default"),
        };
        converted.map_err(|reason| CodecError::schema(path, format!("invalid default: {}", reason)))
    }

    fn resolve_type_name(&self, scope: &str, name: &str) -> Option<TypeRef> {
        if let Some(absolute) = name.strip_prefix('.') {
            return self.names.get(absolute).copied();
        }

        let mut scope = scope;
        loop {
            if let Some(found) = self.names.get(&qualify(scope, name)) {
                return Some(*found);
            }
            if scope.is_empty() {
                return None;
            }
            scope = scope.rfind('.').map(|pos| &scope[..pos]).unwrap_or("");
        }
    }
}

fn parse_field(message: usize, name: &str, raw: &Value, path: &str) -> CodecResult<PendingField> {
    let obj = raw.as_object().ok_or_else(|| CodecError::schema(path, "object expected"))?;

    let type_name = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| CodecError::schema(path, "type: string expected"))?
        .to_string();

    let number = obj
        .get("id")
        .and_then(Value::as_u64)
        .filter(|id| (1..=MAX_FIELD_NUMBER).contains(id) && !RESERVED_FIELD_NUMBERS.contains(id))
        .ok_or_else(|| CodecError::schema(path, "id: valid field number expected"))?
        as u32;

    let rule = match obj.get("rule") {
        None | Some(Value::Null) => FieldRule::Optional,
        Some(rule) => rule
            .as_str()
            .and_then(FieldRule::from_name)
            .ok_or_else(|| CodecError::schema(path, format!("invalid rule {}", rule)))?,
    };

    let key_type = match obj.get("keyType") {
        None | Some(Value::Null) => None,
        Some(key) => Some(
            key.as_str()
                .ok_or_else(|| CodecError::schema(path, "keyType: string expected"))?
                .to_string(),
        ),
    };

    let options = obj.get("options").and_then(Value::as_object);
    let packed = match options.and_then(|o| o.get("packed")) {
        None => None,
        Some(packed) => Some(
            packed
                .as_bool()
                .ok_or_else(|| CodecError::schema(path, "options.packed: boolean expected"))?,
        ),
    };
    let default = options.and_then(|o| o.get("default")).cloned();

    Ok(PendingField {
        message,
        name: name.to_string(),
        number,
        rule,
        type_name,
        key_type,
        packed,
        default,
    })
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn path_or_root(prefix: &str) -> &str {
    if prefix.is_empty() {
        "$"
    } else {
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(value: Value) -> CodecResult<SchemaTree> {
        SchemaTree::build(&SchemaDefinition::new(value))
    }

    fn chat_tree() -> SchemaTree {
        build(json!({
            "nested": {
                "chat": {
                    "nested": {
                        "Message": {
                            "fields": {
                                "from": { "type": "int32", "id": 1 },
                                "kind": { "type": "Kind", "id": 2 },
                                "meta": { "type": "Meta", "id": 3 },
                                "reply": { "type": ".chat.Message", "id": 4 }
                            },
                            "nested": {
                                "Meta": { "fields": { "seq": { "type": "uint64", "id": 1 } } }
                            }
                        },
                        "Kind": { "values": { "TEXT": 0, "IMAGE": 1 } }
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_hierarchical_lookup() {
        let tree = chat_tree();
        assert_eq!(tree.lookup_message("chat.Message").unwrap().full_name(), "chat.Message");
        assert_eq!(
            tree.lookup_message("chat.Message.Meta").unwrap().full_name(),
            "chat.Message.Meta"
        );
        assert!(tree.lookup_message(".chat.Message").is_some());
    }

    #[test]
    fn test_lookup_does_not_match_non_messages() {
        let tree = chat_tree();
        assert!(tree.lookup("chat").is_none());
        assert!(tree.lookup("chat.Kind").is_none());
        assert!(tree.lookup("chat.Kind.TEXT").is_none());
        assert!(tree.lookup("").is_none());
        assert!(tree.lookup("chat..Message").is_none());
        assert!(tree.lookup("chat_Message").is_none());
    }

    #[test]
    fn test_unqualified_route_searches_nested_namespaces() {
        let tree = chat_tree();
        assert_eq!(tree.lookup_message("Message").unwrap().full_name(), "chat.Message");
        assert_eq!(tree.lookup_message("Meta").unwrap().full_name(), "chat.Message.Meta");
        assert_eq!(tree.lookup_message("Message.Meta").unwrap().full_name(), "chat.Message.Meta");
        assert!(tree.lookup_message(".Message").is_none());
        assert!(tree.lookup_message("Kind").is_none());
    }

    #[test]
    fn test_nested_search_follows_declaration_order() {
        let tree = build(json!({
            "nested": {
                "b": { "nested": { "Ping": { "fields": {} } } },
                "a": { "nested": { "Ping": { "fields": {} } } }
            }
        }))
        .unwrap();
        assert_eq!(tree.lookup_message("Ping").unwrap().full_name(), "b.Ping");
        assert_eq!(tree.lookup_message("a.Ping").unwrap().full_name(), "a.Ping");
    }

    #[test]
    fn test_lookup_enum() {
        let tree = chat_tree();
        assert_eq!(tree.lookup_enum("chat.Kind").unwrap().value_of("IMAGE"), Some(1));
        assert_eq!(tree.lookup_enum("Kind").unwrap().full_name(), "chat.Kind");
        assert!(tree.lookup_enum("chat.Message").is_none());
    }

    #[test]
    fn test_relative_and_absolute_references() {
        let tree = chat_tree();
        let msg = tree.lookup_message("chat.Message").unwrap();
        let kind = msg.field_by_name("kind").unwrap().field_type();
        let meta = msg.field_by_name("meta").unwrap().field_type();
        let reply = msg.field_by_name("reply").unwrap().field_type();

        match kind {
            FieldType::Enum(i) => assert_eq!(tree.enum_type(i).full_name(), "chat.Kind"),
            other => panic!("unexpected {:?}", other),
        }
        match meta {
            FieldType::Message(i) => assert_eq!(tree.message(i).full_name(), "chat.Message.Meta"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(reply, FieldType::Message(tree.lookup("chat.Message").unwrap()));
    }

    #[test]
    fn test_unresolvable_type_fails() {
        let err = build(json!({
            "nested": { "M": { "fields": { "x": { "type": "Missing", "id": 1 } } } }
        }))
        .unwrap_err();
        match err {
            CodecError::SchemaParseError { path, reason } => {
                assert_eq!(path, "M.x");
                assert!(reason.contains("Missing"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_field_ids() {
        for id in [json!(0), json!(19_500), json!(536_870_912), json!("1")] {
            let result = build(json!({
                "nested": { "M": { "fields": { "x": { "type": "int32", "id": id } } } }
            }));
            assert!(matches!(result, Err(CodecError::SchemaParseError { .. })));
        }
    }

    #[test]
    fn test_duplicate_field_id() {
        let result = build(json!({
            "nested": { "M": { "fields": {
                "a": { "type": "int32", "id": 1 },
                "b": { "type": "string", "id": 1 }
            } } }
        }));
        assert!(matches!(result, Err(CodecError::SchemaParseError { .. })));
    }

    #[test]
    fn test_map_field_validation() {
        let ok = build(json!({
            "nested": { "M": { "fields": {
                "labels": { "keyType": "string", "type": "int32", "id": 1 }
            } } }
        }))
        .unwrap();
        let field = ok.lookup_message("M").unwrap().field_by_name("labels").unwrap();
        assert_eq!(field.map_key(), Some(ScalarType::String));

        let bad_key = build(json!({
            "nested": { "M": { "fields": {
                "labels": { "keyType": "double", "type": "int32", "id": 1 }
            } } }
        }));
        assert!(bad_key.is_err());
    }

    #[test]
    fn test_packed_defaults() {
        let tree = build(json!({
            "nested": { "M": { "fields": {
                "a": { "rule": "repeated", "type": "int32", "id": 1 },
                "b": { "rule": "repeated", "type": "int32", "id": 2, "options": { "packed": false } },
                "c": { "rule": "repeated", "type": "string", "id": 3 }
            } } }
        }))
        .unwrap();
        let msg = tree.lookup_message("M").unwrap();
        assert!(msg.field_by_name("a").unwrap().is_packed());
        assert!(!msg.field_by_name("b").unwrap().is_packed());
        assert!(!msg.field_by_name("c").unwrap().is_packed());
    }

    #[test]
    fn test_oneof_resolution() {
        let tree = build(json!({
            "nested": { "M": {
                "fields": {
                    "text": { "type": "string", "id": 1 },
                    "image": { "type": "bytes", "id": 2 }
                },
                "oneofs": { "body": { "oneof": ["text", "image"] } }
            } }
        }))
        .unwrap();
        let msg = tree.lookup_message("M").unwrap();
        assert_eq!(msg.oneofs().len(), 1);
        assert_eq!(msg.field_by_name("image").unwrap().oneof(), Some(0));

        let bad = build(json!({
            "nested": { "M": {
                "fields": { "text": { "type": "string", "id": 1 } },
                "oneofs": { "body": { "oneof": ["text", "nope"] } }
            } }
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_declared_defaults() {
        let tree = build(json!({
            "nested": {
                "M": { "fields": {
                    "n": { "type": "int32", "id": 1, "options": { "default": 7 } },
                    "k": { "type": "Kind", "id": 2, "options": { "default": "B" } }
                } },
                "Kind": { "values": { "A": 0, "B": 1 } }
            }
        }))
        .unwrap();
        let msg = tree.lookup_message("M").unwrap();
        assert_eq!(msg.field_by_name("n").unwrap().declared_default(), Some(&FieldValue::Int32(7)));
        assert_eq!(msg.field_by_name("k").unwrap().declared_default(), Some(&FieldValue::Enum(1)));

        let bad = build(json!({
            "nested": { "M": { "fields": {
                "n": { "type": "int32", "id": 1, "options": { "default": "x" } }
            } } }
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_services_are_skipped() {
        let tree = build(json!({
            "nested": {
                "Svc": { "methods": { "Call": { "requestType": "M", "responseType": "M" } } },
                "M": { "fields": {} }
            }
        }))
        .unwrap();
        assert!(tree.lookup("Svc").is_none());
        assert_eq!(tree.message_count(), 1);
    }

    #[test]
    fn test_each_build_gets_a_new_id() {
        let a = chat_tree();
        let b = chat_tree();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_root_must_be_object() {
        assert!(build(json!([1, 2, 3])).is_err());
        assert!(build(json!({ "nested": { "a": 5 } })).is_err());
        assert!(build(json!({ "nested": { "a.b": { "nested": {} } } })).is_err());
    }
}
