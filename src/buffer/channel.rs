//! Managed-queue backend
//!
//! Delegates the whole contract to a ready-made bounded MPMC channel, which
//! reduces the coordinator to a thin facade: the channel already provides
//! blocking send/recv with backpressure, FIFO delivery, close-on-shutdown,
//! and drain-after-close.

use crate::buffer::traits::SlotBuffer;
use crate::{QueueError, QueueResult};

/// Bounded buffer delegating to [`async_channel::bounded`]
///
/// Fairness and wakeup order follow the channel's own policy. Both sides are
/// cancel-safe: a dropped `send` has not enqueued and a dropped `recv` has
/// not removed anything.
pub struct ChannelBuffer<T> {
    tx: async_channel::Sender<T>,
    rx: async_channel::Receiver<T>,
    capacity: usize,
}

impl<T> ChannelBuffer<T> {
    const NAME: &'static str = "managed_queue";

    /// Creates an empty buffer with the given capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = async_channel::bounded(capacity);
        Self { tx, rx, capacity }
    }
}

impl<T> SlotBuffer<T> for ChannelBuffer<T>
where
    T: Send + 'static,
{
    async fn produce(&self, item: T) -> QueueResult<()> {
        self.tx
            .send(item)
            .await
            .map_err(|_send_error| QueueError::shutdown(Self::NAME))
    }

    async fn consume(&self) -> QueueResult<T> {
        // recv drains remaining messages after close and only then reports
        // the channel closed, which is exactly the shutdown contract.
        self.rx
            .recv()
            .await
            .map_err(|_closed| QueueError::shutdown(Self::NAME))
    }

    fn try_produce(&self, item: T) -> QueueResult<()> {
        self.tx.try_send(item).map_err(|e| match e {
            async_channel::TrySendError::Full(_) => QueueError::Full {
                capacity: self.capacity,
            },
            async_channel::TrySendError::Closed(_) => QueueError::shutdown(Self::NAME),
        })
    }

    fn try_consume(&self) -> QueueResult<T> {
        self.rx.try_recv().map_err(|e| match e {
            async_channel::TryRecvError::Empty => QueueError::Empty,
            async_channel::TryRecvError::Closed => QueueError::shutdown(Self::NAME),
        })
    }

    fn len(&self) -> usize {
        self.rx.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn shutdown(&self) {
        if self.tx.close() {
            tracing::info!(buffer = Self::NAME, "shutdown signalled, channel closed");
        }
    }

    fn is_shutdown(&self) -> bool {
        self.tx.is_closed()
    }
}
