//! Strategy-dispatching buffer facade

use std::time::Duration;

use crate::buffer::cfg::{BufferCfg, SyncStrategy};
use crate::buffer::channel::ChannelBuffer;
use crate::buffer::monitor::MonitorBuffer;
use crate::buffer::semaphore::SemaphoreBuffer;
use crate::buffer::timed_lock::TimedLockBuffer;
use crate::buffer::traits::SlotBuffer;
use crate::{QueueError, QueueResult};

/// Bounded buffer with the synchronization strategy chosen at construction
///
/// Wraps the four backends behind one concrete type so callers can pick a
/// strategy from configuration without naming a backend in their signatures.
/// All methods delegate; the contract is the backends' contract.
///
/// # Example
/// ```rust
/// use slotq::{BufferCfg, SlotBuffer, SlotQueue, SyncStrategy};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), slotq::QueueError> {
/// let queue = SlotQueue::new(&BufferCfg::new(5, SyncStrategy::Semaphore))?;
/// queue.produce(42u32).await?;
/// assert_eq!(queue.consume().await?, 42);
/// # Ok(())
/// # }
/// ```
pub struct SlotQueue<T: Send + 'static> {
    inner: SlotQueueInner<T>,
    cfg: BufferCfg,
}

enum SlotQueueInner<T: Send + 'static> {
    Monitor(MonitorBuffer<T>),
    Semaphore(SemaphoreBuffer<T>),
    TimedLock(TimedLockBuffer<T>),
    Channel(ChannelBuffer<T>),
}

impl<T: Send + 'static> SlotQueue<T> {
    /// Creates a buffer for the given configuration
    ///
    /// # Errors
    /// Returns [`QueueError::InvalidConfig`] if `cfg.validate()` fails.
    pub fn new(cfg: &BufferCfg) -> QueueResult<Self> {
        cfg.validate()
            .map_err(|reason| QueueError::InvalidConfig { reason })?;
        tracing::debug!(cfg = %cfg, "creating buffer");
        let inner = match cfg.strategy {
            SyncStrategy::Monitor => SlotQueueInner::Monitor(MonitorBuffer::new(cfg.capacity)),
            SyncStrategy::Semaphore => {
                SlotQueueInner::Semaphore(SemaphoreBuffer::new(cfg.capacity))
            }
            SyncStrategy::TimedLock => {
                SlotQueueInner::TimedLock(TimedLockBuffer::new(cfg.capacity))
            }
            SyncStrategy::ManagedQueue => {
                SlotQueueInner::Channel(ChannelBuffer::new(cfg.capacity))
            }
        };
        Ok(Self { inner, cfg: *cfg })
    }

    /// The configuration this buffer was built from
    pub fn cfg(&self) -> &BufferCfg {
        &self.cfg
    }
}

impl<T: Send + 'static> SlotBuffer<T> for SlotQueue<T> {
    async fn produce(&self, item: T) -> QueueResult<()> {
        match &self.inner {
            SlotQueueInner::Monitor(b) => b.produce(item).await,
            SlotQueueInner::Semaphore(b) => b.produce(item).await,
            SlotQueueInner::TimedLock(b) => b.produce(item).await,
            SlotQueueInner::Channel(b) => b.produce(item).await,
        }
    }

    async fn consume(&self) -> QueueResult<T> {
        match &self.inner {
            SlotQueueInner::Monitor(b) => b.consume().await,
            SlotQueueInner::Semaphore(b) => b.consume().await,
            SlotQueueInner::TimedLock(b) => b.consume().await,
            SlotQueueInner::Channel(b) => b.consume().await,
        }
    }

    // Delegated rather than defaulted so the timed-lock backend's native
    // deadline handling is reachable through the facade.
    async fn produce_timeout(&self, item: T, timeout: Duration) -> QueueResult<()> {
        match &self.inner {
            SlotQueueInner::Monitor(b) => b.produce_timeout(item, timeout).await,
            SlotQueueInner::Semaphore(b) => b.produce_timeout(item, timeout).await,
            SlotQueueInner::TimedLock(b) => b.produce_timeout(item, timeout).await,
            SlotQueueInner::Channel(b) => b.produce_timeout(item, timeout).await,
        }
    }

    async fn consume_timeout(&self, timeout: Duration) -> QueueResult<T> {
        match &self.inner {
            SlotQueueInner::Monitor(b) => b.consume_timeout(timeout).await,
            SlotQueueInner::Semaphore(b) => b.consume_timeout(timeout).await,
            SlotQueueInner::TimedLock(b) => b.consume_timeout(timeout).await,
            SlotQueueInner::Channel(b) => b.consume_timeout(timeout).await,
        }
    }

    fn try_produce(&self, item: T) -> QueueResult<()> {
        match &self.inner {
            SlotQueueInner::Monitor(b) => b.try_produce(item),
            SlotQueueInner::Semaphore(b) => b.try_produce(item),
            SlotQueueInner::TimedLock(b) => b.try_produce(item),
            SlotQueueInner::Channel(b) => b.try_produce(item),
        }
    }

    fn try_consume(&self) -> QueueResult<T> {
        match &self.inner {
            SlotQueueInner::Monitor(b) => b.try_consume(),
            SlotQueueInner::Semaphore(b) => b.try_consume(),
            SlotQueueInner::TimedLock(b) => b.try_consume(),
            SlotQueueInner::Channel(b) => b.try_consume(),
        }
    }

    fn len(&self) -> usize {
        match &self.inner {
            SlotQueueInner::Monitor(b) => b.len(),
            SlotQueueInner::Semaphore(b) => b.len(),
            SlotQueueInner::TimedLock(b) => b.len(),
            SlotQueueInner::Channel(b) => b.len(),
        }
    }

    fn capacity(&self) -> usize {
        self.cfg.capacity
    }

    fn shutdown(&self) {
        match &self.inner {
            SlotQueueInner::Monitor(b) => b.shutdown(),
            SlotQueueInner::Semaphore(b) => b.shutdown(),
            SlotQueueInner::TimedLock(b) => b.shutdown(),
            SlotQueueInner::Channel(b) => b.shutdown(),
        }
    }

    fn is_shutdown(&self) -> bool {
        match &self.inner {
            SlotQueueInner::Monitor(b) => b.is_shutdown(),
            SlotQueueInner::Semaphore(b) => b.is_shutdown(),
            SlotQueueInner::TimedLock(b) => b.is_shutdown(),
            SlotQueueInner::Channel(b) => b.is_shutdown(),
        }
    }
}
