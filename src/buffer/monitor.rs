//! Condition-wait backend
//!
//! The classic monitor pattern: one mutex guarding the queue, plus two wakers
//! standing in for the `not_full` / `not_empty` condition variables. Waiters
//! always re-check the condition in a loop after waking.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::Notify;

use crate::buffer::traits::SlotBuffer;
use crate::{QueueError, QueueResult};

/// Bounded buffer built on a mutex and two notify wakers
///
/// Wakeups use `notify_waiters`, which stores no permit: a waiter whose
/// future is dropped mid-wait cannot strand a wakeup that another waiter
/// needed. The cost is that every insert/remove wakes all parked waiters on
/// the opposite side; the mandatory re-check loop sorts out who actually
/// gets the slot. No fairness is promised.
///
/// The guard is never held across an await point, so the lock itself cannot
/// be poisoned by task cancellation.
pub struct MonitorBuffer<T> {
    queue: Mutex<VecDeque<T>>,
    not_full: Notify,
    not_empty: Notify,
    closed: AtomicBool,
    capacity: usize,
}

impl<T> MonitorBuffer<T> {
    const NAME: &'static str = "monitor";

    /// Creates an empty buffer with the given capacity
    ///
    /// Capacity must be validated (> 0) by the caller;
    /// [`SlotQueue::new`](crate::SlotQueue::new) does this.
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            not_full: Notify::new(),
            not_empty: Notify::new(),
            closed: AtomicBool::new(false),
            capacity,
        }
    }

    /// Tries to push under the lock; gives the item back when full
    fn offer(&self, item: T) -> Result<(), T> {
        let mut queue = self.queue.lock().unwrap();
        if queue.len() < self.capacity {
            queue.push_back(item);
            Ok(())
        } else {
            Err(item)
        }
    }

    /// Tries to pop under the lock
    fn poll(&self) -> Option<T> {
        self.queue.lock().unwrap().pop_front()
    }

    fn has_room(&self) -> bool {
        self.queue.lock().unwrap().len() < self.capacity
    }

    fn has_item(&self) -> bool {
        !self.queue.lock().unwrap().is_empty()
    }
}

impl<T> SlotBuffer<T> for MonitorBuffer<T>
where
    T: Send + 'static,
{
    async fn produce(&self, item: T) -> QueueResult<()> {
        let mut item = item;
        loop {
            if self.closed.load(Ordering::Acquire) {
                return Err(QueueError::shutdown(Self::NAME));
            }
            match self.offer(item) {
                Ok(()) => {
                    self.not_empty.notify_waiters();
                    return Ok(());
                }
                Err(rejected) => item = rejected,
            }
            // Register as a waiter before the final re-check: a consumer that
            // pops and notifies between the check and the park would
            // otherwise be missed.
            let notified = self.not_full.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.has_room() || self.closed.load(Ordering::Acquire) {
                continue;
            }
            notified.await;
        }
    }

    async fn consume(&self) -> QueueResult<T> {
        loop {
            if let Some(item) = self.poll() {
                self.not_full.notify_waiters();
                return Ok(item);
            }
            // Empty; report shutdown only once nothing is left to drain.
            if self.closed.load(Ordering::Acquire) {
                return Err(QueueError::shutdown(Self::NAME));
            }
            let notified = self.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.has_item() || self.closed.load(Ordering::Acquire) {
                continue;
            }
            notified.await;
        }
    }

    fn try_produce(&self, item: T) -> QueueResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(QueueError::shutdown(Self::NAME));
        }
        match self.offer(item) {
            Ok(()) => {
                self.not_empty.notify_waiters();
                Ok(())
            }
            Err(_rejected) => Err(QueueError::Full {
                capacity: self.capacity,
            }),
        }
    }

    fn try_consume(&self) -> QueueResult<T> {
        match self.poll() {
            Some(item) => {
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
        self.queue.lock().unwrap().len()
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
