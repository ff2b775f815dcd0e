//! The bounded-buffer contract trait
//!
//! Every synchronization backend implements [`SlotBuffer`]; the property
//! suite in `tests/` runs against the trait, so backends stay independently
//! testable and interchangeable.

use core::future::Future;
use core::time::Duration;

use crate::{QueueError, QueueResult};

/// Backend-agnostic bounded-buffer trait
///
/// The contract every backend upholds:
///
/// 1. **Capacity invariant**: `0 <= len() <= capacity()` at every observation
///    point.
/// 2. **FIFO**: items are consumed in the order they were enqueued. Items
///    from racing producers may interleave, but no single producer's items
///    are reordered relative to themselves.
/// 3. **Blocking**: `produce` suspends while the buffer is full, `consume`
///    while it is empty. Neither busy-spins and neither fails just because
///    the buffer is momentarily full/empty.
/// 4. **Re-check after wake**: a waiter that is woken re-checks the
///    fullness/emptiness condition before proceeding. Being woken never
///    implies eligibility: another waiter may have taken the slot, or the
///    wakeup may be spurious.
/// 5. **Cancel safety**: dropping an in-flight `produce`/`consume` future
///    (e.g. losing a `tokio::select!` race) leaves the occupancy accounting
///    consistent. A cancelled `produce` has not enqueued; a cancelled
///    `consume` has not removed anything.
/// 6. **Shutdown**: `shutdown()` is monotonic and wakes every blocked caller.
///    Producers then fail fast with [`QueueError::Shutdown`]; consumers keep
///    draining queued items and see `Shutdown` only once the buffer is empty.
///
/// # Example
///
/// Typical consumer loop:
///
/// ```rust,ignore
/// async fn drain<B: SlotBuffer<u32>>(buffer: &B) {
///     loop {
///         match buffer.consume().await {
///             Ok(item) => process(item),
///             Err(QueueError::Shutdown { .. }) => break,
///             Err(e) => {
///                 tracing::error!("consume failed: {e}");
///                 break;
///             }
///         }
///     }
/// }
/// ```
pub trait SlotBuffer<T>: Send + Sync
where
    T: Send + 'static,
{
    /// Inserts `item` at the tail, waiting for a free slot if necessary
    ///
    /// Never drops an item on the success path. Fails with
    /// [`QueueError::Shutdown`] once the buffer is shut down.
    ///
    /// # Cancel safety
    /// Dropping the returned future before completion leaves the buffer
    /// unchanged; the item is dropped with the future.
    fn produce(&self, item: T) -> impl Future<Output = QueueResult<()>> + Send + '_;

    /// Removes and returns the head item, waiting for one if necessary
    ///
    /// After shutdown, keeps returning queued items until the buffer is
    /// drained, then fails with [`QueueError::Shutdown`].
    ///
    /// # Cancel safety
    /// The dequeue and the return are atomic from the caller's perspective:
    /// a dropped future has removed nothing.
    fn consume(&self) -> impl Future<Output = QueueResult<T>> + Send + '_;

    /// Bounded-wait `produce`
    ///
    /// Returns [`QueueError::ProduceTimeout`] if no slot frees up within
    /// `timeout`, leaving occupancy untouched. The item is given up on
    /// timeout; callers that cannot afford that should retry with a fresh
    /// item or use the blocking variant.
    ///
    /// The default wraps [`produce`](Self::produce) in [`tokio::time::timeout`],
    /// which is correct for any cancel-safe implementation.
    fn produce_timeout(
        &self,
        item: T,
        timeout: Duration,
    ) -> impl Future<Output = QueueResult<()>> + Send + '_ {
        async move {
            match tokio::time::timeout(timeout, self.produce(item)).await {
                Ok(result) => result,
                Err(_elapsed) => Err(QueueError::ProduceTimeout {
                    waited_ms: timeout.as_millis() as u64,
                }),
            }
        }
    }

    /// Bounded-wait `consume`
    ///
    /// Returns [`QueueError::ConsumeTimeout`] if no item arrives within
    /// `timeout`. A timed-out call has removed nothing.
    fn consume_timeout(
        &self,
        timeout: Duration,
    ) -> impl Future<Output = QueueResult<T>> + Send + '_ {
        async move {
            match tokio::time::timeout(timeout, self.consume()).await {
                Ok(result) => result,
                Err(_elapsed) => Err(QueueError::ConsumeTimeout {
                    waited_ms: timeout.as_millis() as u64,
                }),
            }
        }
    }

    /// Non-blocking `produce`
    ///
    /// Returns [`QueueError::Full`] instead of waiting.
    fn try_produce(&self, item: T) -> QueueResult<()>;

    /// Non-blocking `consume`
    ///
    /// Returns [`QueueError::Empty`] instead of waiting.
    fn try_consume(&self) -> QueueResult<T>;

    /// Advisory snapshot of current occupancy
    ///
    /// Non-blocking and possibly stale by the time the caller looks at it;
    /// useful for logging and for asserting the capacity invariant.
    fn len(&self) -> usize;

    /// Returns `true` if the advisory occupancy snapshot is zero
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The fixed capacity bound
    fn capacity(&self) -> usize;

    /// Shuts the buffer down and wakes every blocked producer and consumer
    ///
    /// Monotonic and idempotent: once shut down, a buffer never reopens.
    /// The flag itself is an atomic store taken without the buffer's
    /// critical section.
    fn shutdown(&self);

    /// Non-blocking read of the shutdown flag
    fn is_shutdown(&self) -> bool;
}
