//! Counting-semaphore backend
//!
//! The textbook PV arrangement: an `empty` semaphore counts free slots, a
//! `full` semaphore counts queued items, and a mutex guards the queue itself.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::Semaphore;

use crate::buffer::traits::SlotBuffer;
use crate::{QueueError, QueueResult};

/// Bounded buffer built on an empty/full counting-semaphore pair
///
/// A producer acquires an `empty` permit, pushes inside the mutex, then
/// releases one `full` permit; a consumer does the mirror image. The
/// empty/full permit is always acquired **before** the mutex: taking the
/// mutex first deadlocks the moment a producer and a consumer block at the
/// same time, each holding the lock the other needs.
///
/// Acquired permits are forgotten and the opposite semaphore is re-credited
/// with `add_permits`, so permits flow between the two counters instead of
/// returning where they came from.
///
/// Shutdown closes both semaphores, which wakes every blocked acquire.
/// Consumers then fall back to draining the queue directly under the mutex;
/// permit accounting is over at that point.
pub struct SemaphoreBuffer<T> {
    queue: Mutex<VecDeque<T>>,
    empty: Semaphore,
    full: Semaphore,
    capacity: usize,
}

impl<T> SemaphoreBuffer<T> {
    const NAME: &'static str = "semaphore";

    /// Creates an empty buffer with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            empty: Semaphore::new(capacity),
            full: Semaphore::new(0),
            capacity,
        }
    }
}

impl<T> SlotBuffer<T> for SemaphoreBuffer<T>
where
    T: Send + 'static,
{
    async fn produce(&self, item: T) -> QueueResult<()> {
        // P(empty) before P(mutex). Acquire is cancel-safe: a dropped future
        // has taken no permit.
        match self.empty.acquire().await {
            Ok(permit) => {
                permit.forget();
                self.queue.lock().unwrap().push_back(item);
                self.full.add_permits(1);
                Ok(())
            }
            Err(_closed) => Err(QueueError::shutdown(Self::NAME)),
        }
    }

    async fn consume(&self) -> QueueResult<T> {
        match self.full.acquire().await {
            Ok(permit) => {
                permit.forget();
                match self.queue.lock().unwrap().pop_front() {
                    Some(item) => {
                        self.empty.add_permits(1);
                        Ok(item)
                    }
                    // Lost a race against a post-shutdown drain; the permit
                    // no longer means anything.
                    None => Err(QueueError::shutdown(Self::NAME)),
                }
            }
            Err(_closed) => {
                // Shut down: drain leftovers without permit accounting.
                match self.queue.lock().unwrap().pop_front() {
                    Some(item) => Ok(item),
                    None => Err(QueueError::shutdown(Self::NAME)),
                }
            }
        }
    }

    fn try_produce(&self, item: T) -> QueueResult<()> {
        match self.empty.try_acquire() {
            Ok(permit) => {
                permit.forget();
                self.queue.lock().unwrap().push_back(item);
                self.full.add_permits(1);
                Ok(())
            }
            Err(tokio::sync::TryAcquireError::NoPermits) => Err(QueueError::Full {
                capacity: self.capacity,
            }),
            Err(tokio::sync::TryAcquireError::Closed) => Err(QueueError::shutdown(Self::NAME)),
        }
    }

    fn try_consume(&self) -> QueueResult<T> {
        match self.full.try_acquire() {
            Ok(permit) => {
                permit.forget();
                match self.queue.lock().unwrap().pop_front() {
                    Some(item) => {
                        self.empty.add_permits(1);
                        Ok(item)
                    }
                    None => Err(QueueError::shutdown(Self::NAME)),
                }
            }
            Err(tokio::sync::TryAcquireError::NoPermits) => Err(QueueError::Empty),
            Err(tokio::sync::TryAcquireError::Closed) => {
                match self.queue.lock().unwrap().pop_front() {
                    Some(item) => Ok(item),
                    None => Err(QueueError::shutdown(Self::NAME)),
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
        if !self.empty.is_closed() {
            tracing::info!(buffer = Self::NAME, "shutdown signalled, closing semaphores");
        }
        self.empty.close();
        self.full.close();
    }

    fn is_shutdown(&self) -> bool {
        self.empty.is_closed()
    }
}
