pub mod snapshot_cycle;
pub mod stream_cycle;
