//! Error handling for slotq operations
//!
//! One unified error type covers every outcome a buffer operation can have
//! besides success. Timeouts and shutdown are expected, matchable conditions,
//! not generic failures: a worker loop is supposed to branch on them and
//! either retry, drain, or exit.
//!
//! # Error Categories
//!
//! - **Shutdown**: the buffer was closed; producers fail fast, consumers see
//!   this only once the backlog is drained
//! - **Timeout**: a bounded-wait `produce`/`consume` ran out of time; the
//!   buffer occupancy is untouched
//! - **Refusal**: a non-blocking `try_produce`/`try_consume` found the buffer
//!   full/empty
//! - **Configuration**: an invalid [`BufferCfg`](crate::BufferCfg) was
//!   rejected at construction
//! - **Worker**: a spawned worker task failed to run to completion
//!
//! # Example
//!
//! ```rust
//! use slotq::{QueueError, QueueResult};
//!
//! fn handle(result: QueueResult<u32>) {
//!     match result {
//!         Ok(item) => println!("got {item}"),
//!         Err(QueueError::ConsumeTimeout { waited_ms }) => {
//!             // Expected under light load: re-check shutdown and retry.
//!             println!("nothing within {waited_ms}ms");
//!         }
//!         Err(QueueError::Shutdown { .. }) => {
//!             // Buffer drained and closed: exit the loop.
//!         }
//!         Err(other) => eprintln!("unexpected: {other}"),
//!     }
//! }
//! ```

use thiserror::Error;

/// Result type for all slotq operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Unified error type for buffer and worker operations
#[derive(Debug, Error)]
pub enum QueueError {
    /// The buffer has been shut down
    ///
    /// Producers receive this immediately after `shutdown()`. Consumers keep
    /// draining queued items and receive this only when the buffer is empty.
    #[error("Buffer shut down: {buffer_name}")]
    Shutdown {
        /// Name of the backend that was shut down
        buffer_name: &'static str,
    },

    /// A bounded-wait `produce` did not find a free slot in time
    ///
    /// The item was not enqueued and the buffer occupancy is unchanged.
    #[error("Produce timed out after {waited_ms}ms")]
    ProduceTimeout {
        /// Configured wait in milliseconds
        waited_ms: u64,
    },

    /// A bounded-wait `consume` did not find an item in time
    #[error("Consume timed out after {waited_ms}ms")]
    ConsumeTimeout {
        /// Configured wait in milliseconds
        waited_ms: u64,
    },

    /// A non-blocking `try_produce` found the buffer full
    #[error("Buffer full ({capacity} slots)")]
    Full {
        /// Fixed capacity of the buffer
        capacity: usize,
    },

    /// A non-blocking `try_consume` found the buffer empty
    #[error("Buffer empty")]
    Empty,

    /// Buffer configuration was rejected at construction
    #[error("Invalid buffer configuration: {reason}")]
    InvalidConfig {
        /// Why validation failed
        reason: &'static str,
    },

    /// A worker task did not run to completion (panicked or was aborted)
    #[error("Worker {worker_id} failed: {message}")]
    WorkerFailed {
        /// Id the worker was spawned with
        worker_id: usize,
        /// Join error description
        message: String,
    },
}

impl QueueError {
    /// Shorthand for the shutdown variant, used by every backend
    pub(crate) fn shutdown(buffer_name: &'static str) -> Self {
        QueueError::Shutdown { buffer_name }
    }

    /// Returns `true` for the two timeout variants
    ///
    /// Lets worker loops treat produce- and consume-side timeouts uniformly
    /// when deciding whether to retry.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            QueueError::ProduceTimeout { .. } | QueueError::ConsumeTimeout { .. }
        )
    }

    /// Returns `true` if the error means the buffer is closed for good
    pub fn is_shutdown(&self) -> bool {
        matches!(self, QueueError::Shutdown { .. })
    }
}
