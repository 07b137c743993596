// crates/server/src/jobs/mod.rs
//! Background retrieval jobs and their progress fan-out.
//!
//! Provides:
//! - `JobRunner`: starts, deduplicates and cancels jobs
//! - `BroadcastHub`: stores snapshots and pushes them to subscribers
//! - `progress_stream`: per-connection stream with keepalives
//! - `spawn_sweeper`: evicts finished jobs after the retention period

pub mod hub;
pub mod progress;
pub mod registry;
pub mod runner;
pub mod store;
pub mod stream;
pub mod sweeper;
pub mod types;

pub use hub::BroadcastHub;
pub use registry::{SubscriberId, SubscriberRegistry, Subscription};
pub use runner::JobRunner;
pub use store::ProgressStore;
pub use stream::progress_stream;
pub use sweeper::{spawn_sweeper, sweep_expired};
pub use types::{JobStatus, ProgressSnapshot, StreamEvent};
