use async_trait::async_trait;
use tokio::sync::mpsc;

/// Failure reported by a wrapped producer. Timeouts are the producer's own
/// policy; the adapter forwards them unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProducerError {
    #[error("producer failed: {0}")]
    Failed(String),

    #[error("producer timed out after {0}ms")]
    Timeout(u64),

    #[error("producer channel closed before completion")]
    ChannelClosed,
}

/// One live subscription: zero or more values, then completion (channel
/// close) or a terminal error.
#[derive(Debug)]
pub struct Subscription<T> {
    items: mpsc::Receiver<Result<T, ProducerError>>,
}

impl<T> Subscription<T> {
    pub fn new(items: mpsc::Receiver<Result<T, ProducerError>>) -> Self {
        Self { items }
    }

    /// Build a subscription plus the sender half a producer emits into.
    pub fn channel(buffer: usize) -> (mpsc::Sender<Result<T, ProducerError>>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx))
    }

    /// Next emission; `None` once the producer completed.
    pub async fn next(&mut self) -> Option<Result<T, ProducerError>> {
        self.items.recv().await
    }
}

/// An asynchronous/streaming source: subscribe, receive zero or more values,
/// optionally complete, optionally fail. The adapter assumes nothing beyond
/// this.
#[async_trait]
pub trait Producer: Send + Sync {
    type Item: Send + 'static;

    async fn subscribe(&self) -> Result<Subscription<Self::Item>, ProducerError>;
}
