//! Mock producer for deterministic testing
//!
//! Implements the `Producer` trait to emit pre-configured values without any
//! real backing source. Use this for integration tests that need to verify
//! origin/replay cache behavior, including how many live subscriptions a
//! cycle actually opened.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::adapter::producer::{Producer, ProducerError, Subscription};

/// Configuration for mock producer behavior
#[derive(Clone)]
pub struct MockConfig<T> {
    /// Values to emit on each subscription
    pub values: Vec<T>,
    /// Delay between emissions (simulates streaming)
    pub emit_delay: Duration,
    /// Error emitted after the configured values, if any
    pub trailing_error: Option<ProducerError>,
    /// Error returned by subscribe() itself, if any
    pub subscribe_error: Option<ProducerError>,
}

impl<T> Default for MockConfig<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            emit_delay: Duration::ZERO,
            trailing_error: None,
            subscribe_error: None,
        }
    }
}

impl<T> MockConfig<T> {
    /// Configure values to emit on each subscription
    pub fn with_values(mut self, values: Vec<T>) -> Self {
        self.values = values;
        self
    }

    /// Configure delay between emissions (default: Duration::ZERO)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.emit_delay = delay;
        self
    }

    /// Configure the mock to fail after emitting the configured values
    pub fn failing_with(mut self, error: ProducerError) -> Self {
        self.trailing_error = Some(error);
        self
    }

    /// Configure subscribe() itself to fail
    pub fn failing_on_subscribe(mut self, error: ProducerError) -> Self {
        self.subscribe_error = Some(error);
        self
    }
}

/// Mock producer for testing
///
/// Emits pre-configured values and counts subscriptions so tests can assert
/// the exactly-once property directly.
pub struct MockProducer<T> {
    config: MockConfig<T>,
    subscriptions: Arc<AtomicUsize>,
}

impl<T> MockProducer<T> {
    pub fn new() -> Self {
        Self {
            config: MockConfig::default(),
            subscriptions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Configure the mock with a MockConfig
    pub fn with_config(mut self, config: MockConfig<T>) -> Self {
        self.config = config;
        self
    }

    /// Configure values to emit (convenience method)
    pub fn with_values(mut self, values: Vec<T>) -> Self {
        self.config.values = values;
        self
    }

    /// Number of live subscriptions opened so far
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }
}

impl<T> Default for MockProducer<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> Producer for MockProducer<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;

    async fn subscribe(&self) -> Result<Subscription<T>, ProducerError> {
        if let Some(err) = &self.config.subscribe_error {
            return Err(err.clone());
        }
        self.subscriptions.fetch_add(1, Ordering::SeqCst);

        let (tx, sub) = Subscription::channel(32);
        let values = self.config.values.clone();
        let delay = self.config.emit_delay;
        let trailing_error = self.config.trailing_error.clone();
        tokio::spawn(async move {
            for value in values {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if tx.send(Ok(value)).await.is_err() {
                    return;
                }
            }
            if let Some(err) = trailing_error {
                let _ = tx.send(Err(err)).await;
            }
        });
        Ok(sub)
    }
}
