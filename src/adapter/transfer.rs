use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::adapter::error::AdapterError;
use crate::adapter::producer::{Producer, Subscription};
use crate::adapter::stream::{Continuation, ReplayStream, StreamOptions};
use crate::context::ExecutionContext;
use crate::key::CacheKey;
use crate::store::{Multiplicity, RecordedValue, StoreError, TransferStore};

const STREAM_BUFFER: usize = 256;

/// Cache-aware wrapper around arbitrary producers.
///
/// On origin it subscribes to the live producer and tees emitted values into
/// the transfer store; on replay it serves recorded values first and only
/// touches the live producer on a miss or an explicit continue-live policy.
#[derive(Clone)]
pub struct TransferAdapter {
    ctx: Arc<ExecutionContext>,
}

impl TransferAdapter {
    pub fn new(ctx: Arc<ExecutionContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    fn store(&self) -> &TransferStore {
        self.ctx.store()
    }

    /// Resolve a single-value logical call.
    ///
    /// Origin records the first emitted value; replay delivers the recorded
    /// value without subscribing, which is what makes the wrapped side effect
    /// happen exactly once across the two executions. A replay miss falls
    /// through to the live producer without writing to the store.
    pub async fn snapshot<P>(&self, key: CacheKey, producer: &P) -> Result<P::Item, AdapterError>
    where
        P: Producer + ?Sized,
        P::Item: Serialize + DeserializeOwned,
    {
        if self.ctx.is_origin() {
            return self.snapshot_origin(key, producer).await;
        }

        match self.store().get(&key) {
            Some(entry) => match entry.recorded {
                RecordedValue::One { value } => {
                    tracing::trace!(key = %key, "replaying recorded snapshot");
                    decode(&key, value)
                }
                RecordedValue::Many { .. } => Err(AdapterError::MultiplicityMismatch {
                    key,
                    expected: Multiplicity::One,
                    found: Multiplicity::Many,
                }),
            },
            None => {
                tracing::trace!(key = %key, "snapshot miss; subscribing live");
                first_value(producer).await
            }
        }
    }

    async fn snapshot_origin<P>(
        &self,
        key: CacheKey,
        producer: &P,
    ) -> Result<P::Item, AdapterError>
    where
        P: Producer + ?Sized,
        P::Item: Serialize + DeserializeOwned,
    {
        let slot = self.store().reserve(key)?;
        match first_value(producer).await {
            Ok(value) => {
                slot.fill(&value)?;
                Ok(value)
            }
            Err(err) => {
                // Failures are never recorded; replay will miss and retry
                // with its own live producer.
                slot.abandon();
                Err(err)
            }
        }
    }

    /// Resolve a multi-value logical call.
    ///
    /// Origin tees every emitted value into the store while forwarding it
    /// downstream; replay delivers recorded values in recorded order and then
    /// applies the call's continuation policy. A replay miss falls through to
    /// the live producer without recording.
    pub async fn stream<P>(
        &self,
        key: CacheKey,
        producer: Arc<P>,
        options: StreamOptions,
    ) -> Result<ReplayStream<P::Item>, AdapterError>
    where
        P: Producer + ?Sized + 'static,
        P::Item: Serialize + DeserializeOwned,
    {
        if self.ctx.is_origin() {
            return self.stream_origin(key, producer.as_ref(), options).await;
        }

        match self.store().get(&key) {
            Some(entry) => match entry.recorded {
                RecordedValue::Many { values } => {
                    tracing::trace!(key = %key, count = values.len(), "replaying recorded stream");
                    Ok(replay_recorded(key, values, producer, options.continuation))
                }
                RecordedValue::One { .. } => Err(AdapterError::MultiplicityMismatch {
                    key,
                    expected: Multiplicity::Many,
                    found: Multiplicity::One,
                }),
            },
            None => {
                tracing::trace!(key = %key, "stream miss; subscribing live");
                let sub = producer.subscribe().await?;
                Ok(forward_live(sub))
            }
        }
    }

    async fn stream_origin<P>(
        &self,
        key: CacheKey,
        producer: &P,
        options: StreamOptions,
    ) -> Result<ReplayStream<P::Item>, AdapterError>
    where
        P: Producer + ?Sized,
        P::Item: Serialize + DeserializeOwned,
    {
        let recorder = self.store().begin_stream(key, options.truncation)?;
        let mut sub = match producer.subscribe().await {
            Ok(sub) => sub,
            Err(err) => {
                recorder.abandon();
                return Err(AdapterError::Producer(err));
            }
        };

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(async move {
            let mut recorder = Some(recorder);
            while let Some(item) = sub.next().await {
                match item {
                    Ok(value) => {
                        match recorder.as_ref().map(|rec| rec.push(&value)) {
                            None | Some(Ok(())) => {}
                            Some(Err(StoreError::Frozen)) => {
                                // Document boundary passed; the capture was
                                // already finalized per its truncation
                                // policy. The live path keeps flowing.
                                recorder = None;
                            }
                            Some(Err(err)) => {
                                tracing::debug!(error = %err, "abandoning stream capture");
                                if let Some(rec) = recorder.take() {
                                    rec.abandon();
                                }
                            }
                        }
                        if tx.send(Ok(value)).await.is_err() {
                            // Downstream gave up on this logical call.
                            if let Some(rec) = recorder.take() {
                                rec.abandon();
                            }
                            return;
                        }
                    }
                    Err(err) => {
                        if let Some(rec) = recorder.take() {
                            rec.abandon();
                        }
                        let _ = tx.send(Err(AdapterError::Producer(err))).await;
                        return;
                    }
                }
            }
            if let Some(rec) = recorder.take() {
                rec.complete();
            }
        });

        Ok(ReplayStream::new(rx))
    }
}

async fn first_value<P>(producer: &P) -> Result<P::Item, AdapterError>
where
    P: Producer + ?Sized,
{
    let mut sub = producer.subscribe().await?;
    match sub.next().await {
        Some(Ok(value)) => Ok(value),
        Some(Err(err)) => Err(AdapterError::Producer(err)),
        None => Err(AdapterError::EmptyProducer),
    }
}

fn replay_recorded<P>(
    key: CacheKey,
    values: Vec<serde_json::Value>,
    producer: Arc<P>,
    continuation: Continuation,
) -> ReplayStream<P::Item>
where
    P: Producer + ?Sized + 'static,
    P::Item: DeserializeOwned,
{
    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    tokio::spawn(async move {
        for value in values {
            let item = decode::<P::Item>(&key, value);
            let failed = item.is_err();
            if tx.send(item).await.is_err() || failed {
                return;
            }
        }
        if continuation == Continuation::ContinueLive {
            match producer.subscribe().await {
                Ok(mut sub) => {
                    while let Some(item) = sub.next().await {
                        let item = item.map_err(AdapterError::Producer);
                        let failed = item.is_err();
                        if tx.send(item).await.is_err() || failed {
                            return;
                        }
                    }
                }
                Err(err) => {
                    let _ = tx.send(Err(AdapterError::Producer(err))).await;
                }
            }
        }
    });
    ReplayStream::new(rx)
}

fn forward_live<T: Send + 'static>(mut sub: Subscription<T>) -> ReplayStream<T> {
    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    tokio::spawn(async move {
        while let Some(item) = sub.next().await {
            let item = item.map_err(AdapterError::Producer);
            let failed = item.is_err();
            if tx.send(item).await.is_err() || failed {
                return;
            }
        }
    });
    ReplayStream::new(rx)
}

fn decode<T: DeserializeOwned>(key: &CacheKey, value: serde_json::Value) -> Result<T, AdapterError> {
    serde_json::from_value(value).map_err(|e| AdapterError::Decode {
        key: key.clone(),
        reason: e.to_string(),
    })
}
