//! Integration tests for multi-value (stream) calls across the cycle
//!
//! Covers the ordering guarantee (recorded values strictly before any
//! live-continuation value), both continuation policies, and the truncation
//! behavior for streams still open at the document boundary.

use std::sync::Arc;

use serde_json::json;

use carryover::{
    derive_key, Continuation, ExecutionContext, MockProducer, StreamOptions, TransferAdapter,
    Truncation,
};

async fn record_stream(values: Vec<serde_json::Value>, options: StreamOptions) -> (Arc<ExecutionContext>, carryover::CacheKey) {
    let ctx = Arc::new(ExecutionContext::origin());
    let adapter = TransferAdapter::new(ctx.clone());
    let key = derive_key("feed", &json!({"channel": "updates"})).unwrap();

    let producer = Arc::new(MockProducer::new().with_values(values));
    adapter
        .stream(key.clone(), producer, options)
        .await
        .unwrap()
        .collect_values()
        .await
        .unwrap();

    (ctx, key)
}

#[tokio::test]
async fn recorded_values_replay_in_origin_order() {
    let options = StreamOptions::new(Continuation::Terminal);
    let (origin_ctx, key) =
        record_stream(vec![json!("a"), json!("b"), json!("c")], options).await;
    let payload = origin_ctx.store().serialize().unwrap();

    let replay_ctx = Arc::new(ExecutionContext::replay(Some(payload.as_str())));
    let replay = TransferAdapter::new(replay_ctx);
    let live: Arc<MockProducer<serde_json::Value>> = Arc::new(MockProducer::new());

    let values = replay
        .stream(key, live.clone(), options)
        .await
        .unwrap()
        .collect_values()
        .await
        .unwrap();

    assert_eq!(values, vec![json!("a"), json!("b"), json!("c")]);
    assert_eq!(live.subscription_count(), 0);
}

#[tokio::test]
async fn continue_live_appends_after_the_recorded_prefix() {
    let options = StreamOptions::new(Continuation::ContinueLive);
    let (origin_ctx, key) = record_stream(vec![json!(1), json!(2)], options).await;
    let payload = origin_ctx.store().serialize().unwrap();

    let replay_ctx = Arc::new(ExecutionContext::replay(Some(payload.as_str())));
    let replay = TransferAdapter::new(replay_ctx);
    let live = Arc::new(MockProducer::new().with_values(vec![json!(3), json!(4)]));

    let values = replay
        .stream(key, live.clone(), options)
        .await
        .unwrap()
        .collect_values()
        .await
        .unwrap();

    // Causal order as observed at origin, then the live continuation.
    assert_eq!(values, vec![json!(1), json!(2), json!(3), json!(4)]);
    assert_eq!(live.subscription_count(), 1);
}

#[tokio::test]
async fn open_stream_at_the_boundary_keeps_its_partial_prefix() {
    let ctx = Arc::new(ExecutionContext::origin());
    let adapter = TransferAdapter::new(ctx.clone());
    let key = derive_key("feed", &json!({"channel": "slow"})).unwrap();

    // A producer that never completes within the cycle: emit two values,
    // then stall far past the document boundary.
    let producer = Arc::new(
        MockProducer::new().with_config(
            carryover::MockConfig::default()
                .with_values(vec![json!("a"), json!("b"), json!("late")])
                .with_delay(std::time::Duration::from_millis(20)),
        ),
    );

    let options = StreamOptions::new(Continuation::ContinueLive);
    let mut stream = adapter.stream(key.clone(), producer, options).await.unwrap();
    assert_eq!(stream.next().await.unwrap().unwrap(), json!("a"));
    assert_eq!(stream.next().await.unwrap().unwrap(), json!("b"));

    // Document generation ends while the producer is still running.
    let payload = ctx.store().serialize().unwrap();

    let replay_ctx = Arc::new(ExecutionContext::replay(Some(payload.as_str())));
    let replay = TransferAdapter::new(replay_ctx);
    let live = Arc::new(MockProducer::new().with_values(vec![json!("live")]));

    let values = replay
        .stream(key, live.clone(), options)
        .await
        .unwrap()
        .collect_values()
        .await
        .unwrap();

    // The partial capture is not a terminal signal: the recorded prefix
    // replays first, then the live producer takes over.
    assert_eq!(values, vec![json!("a"), json!("b"), json!("live")]);
    assert_eq!(live.subscription_count(), 1);
}

#[tokio::test]
async fn drop_partial_streams_replay_as_a_miss() {
    let ctx = Arc::new(ExecutionContext::origin());
    let adapter = TransferAdapter::new(ctx.clone());
    let key = derive_key("feed", &json!({"channel": "slow"})).unwrap();

    let producer = Arc::new(
        MockProducer::new().with_config(
            carryover::MockConfig::default()
                .with_values(vec![json!("a"), json!("b"), json!("late")])
                .with_delay(std::time::Duration::from_millis(20)),
        ),
    );

    let options =
        StreamOptions::new(Continuation::ContinueLive).with_truncation(Truncation::DropPartial);
    let mut stream = adapter.stream(key.clone(), producer, options).await.unwrap();
    assert_eq!(stream.next().await.unwrap().unwrap(), json!("a"));

    let payload = ctx.store().serialize().unwrap();

    let replay_ctx = Arc::new(ExecutionContext::replay(Some(payload.as_str())));
    let replay = TransferAdapter::new(replay_ctx);
    let live = Arc::new(MockProducer::new().with_values(vec![json!("fresh")]));

    let values = replay
        .stream(key, live.clone(), options)
        .await
        .unwrap()
        .collect_values()
        .await
        .unwrap();

    // Nothing was recorded for the key, so replay runs fully live.
    assert_eq!(values, vec![json!("fresh")]);
    assert_eq!(live.subscription_count(), 1);
}

#[tokio::test]
async fn independent_keys_do_not_interfere() {
    let ctx = Arc::new(ExecutionContext::origin());
    let adapter = TransferAdapter::new(ctx.clone());

    let posts_key = derive_key("posts", &json!({"slug": "pasta-cook"})).unwrap();
    let feed_key = derive_key("feed", &json!({"channel": "updates"})).unwrap();

    let posts = MockProducer::new().with_values(vec![json!({"title": "Pasta"})]);
    let feed = Arc::new(MockProducer::new().with_values(vec![json!("a"), json!("b")]));

    adapter.snapshot(posts_key.clone(), &posts).await.unwrap();
    adapter
        .stream(
            feed_key.clone(),
            feed,
            StreamOptions::new(Continuation::Terminal),
        )
        .await
        .unwrap()
        .collect_values()
        .await
        .unwrap();

    let payload = ctx.store().serialize().unwrap();
    let replay_ctx = Arc::new(ExecutionContext::replay(Some(payload.as_str())));

    // Insertion order survives the round trip.
    let keys = replay_ctx.store().keys();
    assert_eq!(keys, vec![posts_key, feed_key]);
}
