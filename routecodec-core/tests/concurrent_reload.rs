//! Concurrent encode/decode while schema definitions are swapped
//!
//! Readers must never observe a partially built tree: every call either
//! runs against the previous definition or the new one.

use routecodec_core::{Codec, CodecError, Payload, SchemaDefinition};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn definition(content_type: &str) -> SchemaDefinition {
    SchemaDefinition::new(json!({
        "nested": { "chat": { "nested": {
            "Message": { "fields": {
                "from": { "type": "int32", "id": 1 },
                "to": { "type": "int32", "id": 2 },
                "content": { "type": content_type, "id": 3 }
            } },
            "Filler": { "fields": {
                "a": { "rule": "repeated", "type": "string", "id": 1 },
                "b": { "keyType": "string", "type": "Message", "id": 2 }
            } }
        } } }
    }))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_encode_during_reload_never_fails() {
    let codec = Arc::new(Codec::new(definition("string"), definition("string")).unwrap());
    let done = Arc::new(AtomicBool::new(false));
    let payload = Payload::try_from(json!({ "from": 1, "to": 2 })).unwrap();

    let mut workers = Vec::new();
    for _ in 0..4 {
        let codec = Arc::clone(&codec);
        let done = Arc::clone(&done);
        let payload = payload.clone();
        workers.push(tokio::spawn(async move {
            let mut calls = 0u64;
            while !done.load(Ordering::Acquire) {
                let bytes = codec.encode("chat.Message", &payload).unwrap();
                assert_eq!(bytes, vec![0x08, 0x01, 0x10, 0x02]);
                let decoded = codec.decode("chat.Message", &bytes).unwrap();
                assert_eq!(decoded.get("from"), Some(&json!(1)));
                calls += 1;
                tokio::task::yield_now().await;
            }
            calls
        }));
    }

    let reloader = {
        let codec = Arc::clone(&codec);
        tokio::spawn(async move {
            for i in 0..200 {
                let content_type = if i % 2 == 0 { "bytes" } else { "string" };
                codec.set_outbound_definition(definition(content_type)).unwrap();
                codec.set_inbound_definition(definition(content_type)).unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    reloader.await.unwrap();
    done.store(true, Ordering::Release);

    let mut total = 0;
    for worker in workers {
        total += worker.await.unwrap();
    }
    assert!(total > 0);
    assert_eq!(codec.registry(routecodec_core::Side::Outbound).generation(), 201);
}

#[tokio::test]
async fn test_failed_reload_keeps_serving() {
    let codec = Arc::new(Codec::new(definition("string"), definition("string")).unwrap());

    let bad = SchemaDefinition::new(json!({
        "nested": { "chat": { "nested": { "Message": { "fields": {
            "from": { "type": "int32", "id": 0 }
        } } } } }
    }));
    let err = codec.set_outbound_definition(bad).unwrap_err();
    assert!(matches!(err, CodecError::SchemaParseError { .. }));

    let handle = {
        let codec = Arc::clone(&codec);
        tokio::spawn(async move {
            let payload = Payload::try_from(json!({ "content": "still here" })).unwrap();
            codec.encode("chat.Message", &payload)
        })
    };
    assert!(handle.await.unwrap().is_ok());
}
