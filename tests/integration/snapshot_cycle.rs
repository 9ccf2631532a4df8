//! Integration tests for the full origin -> payload -> replay snapshot cycle
//!
//! These tests drive the whole mechanism the way a host would: install an
//! origin context, resolve producers through the adapter, serialize the
//! store, boot a replay context from the payload text, and resolve the same
//! logical calls again.

use std::sync::Arc;

use serde_json::json;

use carryover::{
    derive_key, AdapterError, ContextCell, ContextError, ExecutionContext, ExecutionMode,
    MockConfig, MockProducer, ProducerError, ResponseStatus, TransferAdapter,
};

/// The pasta-cook scenario: one full cycle, producer subscribed exactly once.
#[tokio::test]
async fn snapshot_is_fetched_exactly_once_across_the_cycle() {
    // Origin execution renders the document.
    let origin_cell = ContextCell::new();
    let origin_ctx = origin_cell.install(ExecutionContext::origin()).unwrap();
    let origin = TransferAdapter::new(origin_ctx.clone());

    let key = derive_key("posts", &json!({"slug": "pasta-cook"})).unwrap();
    let origin_producer = MockProducer::new().with_values(vec![json!({"title": "Pasta"})]);

    let rendered = origin.snapshot(key.clone(), &origin_producer).await.unwrap();
    assert_eq!(rendered, json!({"title": "Pasta"}));
    assert_eq!(origin_producer.subscription_count(), 1);

    // The document ships with the serialized store.
    let payload = origin_ctx.store().serialize().unwrap();

    // Replay execution boots from the document.
    let replay_cell = ContextCell::new();
    let replay_ctx = replay_cell
        .install(ExecutionContext::replay(Some(payload.as_str())))
        .unwrap();
    let replay = TransferAdapter::new(replay_ctx);

    let replay_key = derive_key("posts", &json!({"slug": "pasta-cook"})).unwrap();
    assert_eq!(replay_key, key);

    let replay_producer = MockProducer::new().with_values(vec![json!({"title": "refetched"})]);
    let activated = replay.snapshot(replay_key, &replay_producer).await.unwrap();

    // Same value, zero replay-side subscriptions: one fetch per cycle total.
    assert_eq!(activated, rendered);
    assert_eq!(replay_producer.subscription_count(), 0);
}

#[tokio::test]
async fn failed_origin_fetch_is_a_replay_miss() {
    let origin_ctx = Arc::new(ExecutionContext::origin());
    let origin = TransferAdapter::new(origin_ctx.clone());

    let key = derive_key("posts", &json!({"slug": "flaky"})).unwrap();
    let failing: MockProducer<serde_json::Value> = MockProducer::new()
        .with_config(MockConfig::default().failing_with(ProducerError::Failed("boom".into())));

    let err = origin.snapshot(key.clone(), &failing).await.unwrap_err();
    assert!(matches!(err, AdapterError::Producer(_)));

    let payload = origin_ctx.store().serialize().unwrap();
    let replay_ctx = Arc::new(ExecutionContext::replay(Some(payload.as_str())));
    let replay = TransferAdapter::new(replay_ctx);

    // No phantom success was recorded; replay retries with its own producer.
    let live = MockProducer::new().with_values(vec![json!({"title": "fresh"})]);
    let value = replay.snapshot(key, &live).await.unwrap();
    assert_eq!(value, json!({"title": "fresh"}));
    assert_eq!(live.subscription_count(), 1);
}

#[tokio::test]
async fn corrupt_payload_degrades_to_live_fetching() {
    let replay_ctx = Arc::new(ExecutionContext::replay(Some("<not a payload>")));
    let replay = TransferAdapter::new(replay_ctx);

    let key = derive_key("posts", &json!({"slug": "pasta-cook"})).unwrap();
    let live = MockProducer::new().with_values(vec![json!({"title": "Pasta"})]);

    let value = replay.snapshot(key, &live).await.unwrap();
    assert_eq!(value, json!({"title": "Pasta"}));
    assert_eq!(live.subscription_count(), 1);
}

#[tokio::test]
async fn payload_text_survives_markup_embedding() {
    let origin_ctx = Arc::new(ExecutionContext::origin());
    let origin = TransferAdapter::new(origin_ctx.clone());

    let key = derive_key("snippets", &json!({"id": 7})).unwrap();
    let producer =
        MockProducer::new().with_values(vec![json!({"html": "</script><script>alert(1)"})]);
    origin.snapshot(key.clone(), &producer).await.unwrap();

    let payload = origin_ctx.store().serialize().unwrap();
    assert!(!payload.as_str().contains('<'));

    // The document pipeline can drop the text straight into a script block;
    // replay parses it back with full fidelity.
    let replay_ctx = Arc::new(ExecutionContext::replay(Some(payload.as_str())));
    let replay = TransferAdapter::new(replay_ctx);
    let untouched: MockProducer<serde_json::Value> = MockProducer::new();
    let value = replay.snapshot(key, &untouched).await.unwrap();
    assert_eq!(value, json!({"html": "</script><script>alert(1)"}));
}

#[tokio::test]
async fn mode_is_fixed_per_cell_and_fails_fast_before_install() {
    let cell = ContextCell::new();
    assert!(matches!(
        cell.current_mode(),
        Err(ContextError::Uninitialized)
    ));

    cell.install(ExecutionContext::origin()).unwrap();
    assert_eq!(cell.current_mode().unwrap(), ExecutionMode::Origin);

    let err = cell.install(ExecutionContext::replay(None)).unwrap_err();
    assert!(matches!(err, ContextError::AlreadyInitialized));
}

#[tokio::test]
async fn origin_status_channel_is_set_once_and_absent_on_replay() {
    let origin_ctx = Arc::new(ExecutionContext::origin());
    let status = origin_ctx.status().unwrap();
    status
        .set(ResponseStatus::new(404).with_message("no such post"))
        .unwrap();
    assert!(status.set(ResponseStatus::new(200)).is_err());
    assert_eq!(status.get().unwrap().code, 404);

    let replay_ctx = ExecutionContext::replay(None);
    assert!(replay_ctx.status().is_none());
}
