//! Explicit-lock backend with deadline-armed waits
//!
//! Same contract as the monitor backend, but built around an explicit async
//! lock and a single deadline computed when a bounded call enters. Every park
//! is armed with `timeout_at` against that deadline, so a timed
//! `produce`/`consume` bounds its *total* wait even when it loses several
//! wakeup races and has to re-park.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::buffer::traits::SlotBuffer;
use crate::{QueueError, QueueResult};

/// Bounded buffer built on an explicit async lock and deadline-armed waits
///
/// Occupancy is mirrored into an atomic counter whenever the queue is
/// mutated, which keeps `len()` non-blocking while the queue itself sits
/// behind an async mutex. The guard is never held across an await point.
///
/// The non-blocking `try_produce`/`try_consume` use `try_lock`; a momentarily
/// contended lock is reported as full/empty, which is within the advisory
/// contract of the non-blocking variants.
pub struct TimedLockBuffer<T> {
    queue: Mutex<VecDeque<T>>,
    occupancy: AtomicUsize,
    not_full: Notify,
    not_empty: Notify,
    closed: AtomicBool,
    capacity: usize,
}

impl<T> TimedLockBuffer<T> {
    const NAME: &'static str = "timed_lock";

    /// Creates an empty buffer with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            occupancy: AtomicUsize::new(0),
            not_full: Notify::new(),
            not_empty: Notify::new(),
            closed: AtomicBool::new(false),
            capacity,
        }
    }

    /// Produce with an optional deadline bounding the total wait
    async fn produce_until(
        &self,
        item: T,
        deadline: Option<Instant>,
        waited_ms: u64,
    ) -> QueueResult<()> {
        let mut item = item;
        loop {
            if self.closed.load(Ordering::Acquire) {
                return Err(QueueError::shutdown(Self::NAME));
            }
            {
                let mut queue = self.queue.lock().await;
                if queue.len() < self.capacity {
                    queue.push_back(item);
                    self.occupancy.store(queue.len(), Ordering::Release);
                    drop(queue);
                    self.not_empty.notify_waiters();
                    return Ok(());
                }
            }
            item = match self.park_full(item, deadline).await {
                Ok(back) => back,
                Err(()) => return Err(QueueError::ProduceTimeout { waited_ms }),
            };
        }
    }

    /// Consume with an optional deadline bounding the total wait
    async fn consume_until(&self, deadline: Option<Instant>, waited_ms: u64) -> QueueResult<T> {
        loop {
            {
                let mut queue = self.queue.lock().await;
                if let Some(item) = queue.pop_front() {
                    self.occupancy.store(queue.len(), Ordering::Release);
                    drop(queue);
                    self.not_full.notify_waiters();
                    return Ok(item);
                }
            }
            if self.closed.load(Ordering::Acquire) {
                return Err(QueueError::shutdown(Self::NAME));
            }
            if self.park_empty(deadline).await.is_err() {
                return Err(QueueError::ConsumeTimeout { waited_ms });
            }
        }
    }

    /// Parks until `not_full` fires or the deadline passes; hands the item
    /// back so the caller can retry the insert
    async fn park_full(&self, item: T, deadline: Option<Instant>) -> Result<T, ()> {
        let notified = self.not_full.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        // Occupancy is published before the waking notify, so a re-check here
        // catches any removal that slipped in before we registered.
        if self.occupancy.load(Ordering::Acquire) < self.capacity
            || self.closed.load(Ordering::Acquire)
        {
            return Ok(item);
        }
        match deadline {
            Some(at) => match tokio::time::timeout_at(at, notified).await {
                Ok(()) => Ok(item),
                Err(_elapsed) => Err(()),
            },
            None => {
                notified.await;
                Ok(item)
            }
        }
    }

    /// Parks until `not_empty` fires or the deadline passes
    async fn park_empty(&self, deadline: Option<Instant>) -> Result<(), ()> {
        let notified = self.not_empty.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.occupancy.load(Ordering::Acquire) > 0 || self.closed.load(Ordering::Acquire) {
            return Ok(());
        }
        match deadline {
            Some(at) => match tokio::time::timeout_at(at, notified).await {
                Ok(()) => Ok(()),
                Err(_elapsed) => Err(()),
            },
            None => {
                notified.await;
                Ok(())
            }
        }
    }
}

impl<T> SlotBuffer<T> for TimedLockBuffer<T>
where
    T: Send + 'static,
{
    async fn produce(&self, item: T) -> QueueResult<()> {
        self.produce_until(item, None, 0).await
    }

    async fn consume(&self) -> QueueResult<T> {
        self.consume_until(None, 0).await
    }

    // Native deadline support instead of the wrap-the-whole-call default:
    // the deadline is computed once and bounds every park in the retry loop.
    async fn produce_timeout(&self, item: T, timeout: std::time::Duration) -> QueueResult<()> {
        let deadline = Instant::now() + timeout;
        self.produce_until(item, Some(deadline), timeout.as_millis() as u64)
            .await
    }

    async fn consume_timeout(&self, timeout: std::time::Duration) -> QueueResult<T> {
        let deadline = Instant::now() + timeout;
        self.consume_until(Some(deadline), timeout.as_millis() as u64)
            .await
    }

    fn try_produce(&self, item: T) -> QueueResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(QueueError::shutdown(Self::NAME));
        }
        let Ok(mut queue) = self.queue.try_lock() else {
            return Err(QueueError::Full {
                capacity: self.capacity,
            });
        };
        if queue.len() < self.capacity {
            queue.push_back(item);
            self.occupancy.store(queue.len(), Ordering::Release);
            drop(queue);
            self.not_empty.notify_waiters();
            Ok(())
        } else {
            Err(QueueError::Full {
                capacity: self.capacity,
            })
        }
    }

    fn try_consume(&self) -> QueueResult<T> {
        let Ok(mut queue) = self.queue.try_lock() else {
            return Err(QueueError::Empty);
        };
        match queue.pop_front() {
            Some(item) => {
                self.occupancy.store(queue.len(), Ordering::Release);
                drop(queue);
                self.not_full.notify_waiters();
                Ok(item)
            }
            None => {
                if self.closed.load(Ordering::Acquire) {
                    Err(QueueError::shutdown(Self::NAME))
                } else {
                    Err(QueueError::Empty)
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.occupancy.load(Ordering::Acquire)
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::info!(buffer = Self::NAME, "shutdown signalled, waking waiters");
            self.not_full.notify_waiters();
            self.not_empty.notify_waiters();
        }
    }

    fn is_shutdown(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
