use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::adapter::error::AdapterError;
use crate::store::Truncation;

/// What a replayed stream does after the recorded values are exhausted.
///
/// There is no default: the policy is an explicit decision at every call
/// site. `ContinueLive` is the safer choice for naturally unbounded
/// producers, since a partial origin-time capture is not a terminal signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// The recorded values are the whole result; complete after them.
    Terminal,
    /// Subscribe the live producer after the recorded values and keep going.
    ContinueLive,
}

/// Per-call configuration for [`crate::adapter::TransferAdapter::stream`].
#[derive(Debug, Clone, Copy)]
pub struct StreamOptions {
    /// Replay-side behavior once recorded values are exhausted.
    pub continuation: Continuation,
    /// Origin-side policy for a capture still open at the document boundary.
    pub truncation: Truncation,
}

impl StreamOptions {
    pub fn new(continuation: Continuation) -> Self {
        Self {
            continuation,
            truncation: Truncation::default(),
        }
    }

    pub fn with_truncation(mut self, truncation: Truncation) -> Self {
        self.truncation = truncation;
        self
    }
}

/// Ordered item stream handed back by
/// [`crate::adapter::TransferAdapter::stream`].
///
/// On replay, recorded values arrive strictly before any live-continuation
/// value, preserving the order observed at origin.
pub struct ReplayStream<T> {
    items: mpsc::Receiver<Result<T, AdapterError>>,
}

impl<T> ReplayStream<T> {
    pub(crate) fn new(items: mpsc::Receiver<Result<T, AdapterError>>) -> Self {
        Self { items }
    }

    /// Next item; `None` once the stream completed.
    pub async fn next(&mut self) -> Option<Result<T, AdapterError>> {
        self.items.recv().await
    }

    /// Drain the remaining items, stopping at the first error.
    pub async fn collect_values(mut self) -> Result<Vec<T>, AdapterError> {
        let mut values = Vec::new();
        while let Some(item) = self.next().await {
            values.push(item?);
        }
        Ok(values)
    }
}

impl<T> Stream for ReplayStream<T> {
    type Item = Result<T, AdapterError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.items.poll_recv(cx)
    }
}
