//! Cache-aware producer adapter: decides, per logical call, whether to
//! subscribe a live producer, replay recorded values, or both.

pub mod error;
pub mod mock;
pub mod producer;
pub mod stream;
pub mod transfer;

pub use error::AdapterError;
pub use mock::{MockConfig, MockProducer};
pub use producer::{Producer, ProducerError, Subscription};
pub use stream::{Continuation, ReplayStream, StreamOptions};
pub use transfer::TransferAdapter;
