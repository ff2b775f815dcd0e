//! slotq Bounded Buffer Coordinator
//!
//! This crate provides a capacity-bounded FIFO buffer for async producer and
//! consumer tasks, with four interchangeable synchronization backends behind
//! one trait, cooperative cancellation, and ready-made worker loops.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use slotq::{cancel_pair, spawn_consumer, spawn_producer};
//! use slotq::{BufferCfg, SlotBuffer, SlotQueue, SyncStrategy};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), slotq::QueueError> {
//! let queue = Arc::new(SlotQueue::new(&BufferCfg::new(5, SyncStrategy::Monitor))?);
//! let (handle, token) = cancel_pair();
//!
//! let producer = spawn_producer(0, Arc::clone(&queue), 0..10u32, token.clone());
//! let consumer = spawn_consumer(1, Arc::clone(&queue), token, |item| async move {
//!     println!("got {item}");
//! });
//!
//! producer.join().await?;
//! queue.shutdown();
//! let report = consumer.join().await?;
//! assert_eq!(report.processed, 10);
//! drop(handle);
//! # Ok(())
//! # }
//! ```
//!
//! # Backends
//!
//! All four satisfy the same [`SlotBuffer`] contract and differ only in the
//! synchronization machinery, selected via [`SyncStrategy`]:
//!
//! - [`MonitorBuffer`]: one mutex, two wakers, condition re-checked in a loop
//! - [`SemaphoreBuffer`]: empty/full permit counting, mutex only for the queue
//! - [`TimedLockBuffer`]: async lock with deadline-bounded waits
//! - [`ChannelBuffer`]: facade over a bounded MPMC channel

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
mod cancel;
mod error;
pub mod worker;

// Public API exports
pub use buffer::{
    BufferCfg, ChannelBuffer, MonitorBuffer, SemaphoreBuffer, SlotBuffer, SlotQueue, SyncStrategy,
    TimedLockBuffer,
};
pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use error::{QueueError, QueueResult};

// Worker loop exports
pub use worker::{
    spawn_consumer, spawn_polling_consumer, spawn_producer, ExitReason, WorkerHandle, WorkerReport,
    WorkerState,
};
