//! Producer and consumer worker loops
//!
//! Workers are plain async closures on spawned tasks, not subclassed thread
//! types: a producer drains an iterator into a buffer, a consumer feeds each
//! received item to a handler. Both observe their [`CancelToken`] at every
//! loop-iteration boundary and race it against the in-flight buffer call, so
//! a blocked worker still reacts promptly to cancellation and to buffer
//! shutdown.
//!
//! Lifecycle is `Running → Draining → Stopped`, published through a watch
//! channel on the returned [`WorkerHandle`]. Terminal state is `Stopped`;
//! there is no way back to `Running`.

use core::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::buffer::SlotBuffer;
use crate::cancel::CancelToken;
use crate::{QueueError, QueueResult};

/// Observable lifecycle state of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Looping over produce/consume calls
    Running,
    /// Exit condition observed; finishing the current step
    Draining,
    /// Loop exited; the report is available via join
    Stopped,
}

/// Why a worker's loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// A producer exhausted its item source
    Completed,
    /// The worker's cancellation token fired
    Cancelled,
    /// The buffer shut down (consumers see this only after draining)
    Shutdown,
}

/// Final tally a worker returns when it stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    /// Id the worker was spawned with
    pub id: usize,
    /// Items successfully produced or consumed
    pub processed: u64,
    /// Why the loop ended
    pub reason: ExitReason,
}

/// Handle to a spawned worker
pub struct WorkerHandle {
    id: usize,
    state_rx: watch::Receiver<WorkerState>,
    join: JoinHandle<WorkerReport>,
}

impl WorkerHandle {
    /// Id the worker was spawned with
    pub fn id(&self) -> usize {
        self.id
    }

    /// Snapshot of the worker's lifecycle state
    pub fn state(&self) -> WorkerState {
        *self.state_rx.borrow()
    }

    /// Returns `true` once the worker task has finished
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the worker to stop and returns its report
    ///
    /// # Errors
    /// Returns [`QueueError::WorkerFailed`] if the task panicked or was
    /// aborted.
    pub async fn join(self) -> QueueResult<WorkerReport> {
        self.join.await.map_err(|e| QueueError::WorkerFailed {
            worker_id: self.id,
            message: e.to_string(),
        })
    }
}

/// Spawns a producer that drains `items` into the buffer
///
/// Stops when the iterator is exhausted (`Completed`), the token fires
/// (`Cancelled`), or the buffer shuts down (`Shutdown`). An in-flight
/// `produce` that loses the cancellation race is dropped without enqueuing;
/// its item is given up.
pub fn spawn_producer<T, B, I>(
    id: usize,
    buffer: Arc<B>,
    items: I,
    token: CancelToken,
) -> WorkerHandle
where
    T: Send + 'static,
    B: SlotBuffer<T> + 'static,
    I: IntoIterator<Item = T>,
    I::IntoIter: Send + 'static,
{
    let (state_tx, state_rx) = watch::channel(WorkerState::Running);
    let mut items = items.into_iter();
    let join = tokio::spawn(async move {
        tracing::debug!(worker = id, "producer running");
        let mut produced = 0u64;
        let reason = loop {
            // Loop-boundary check: a stop requested while we were not
            // blocked must not wait for the next blocking call to notice.
            if token.is_cancelled() {
                break ExitReason::Cancelled;
            }
            let Some(item) = items.next() else {
                break ExitReason::Completed;
            };
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::warn!(worker = id, "cancelled with a produce in flight");
                    break ExitReason::Cancelled;
                }
                result = buffer.produce(item) => match result {
                    Ok(()) => produced += 1,
                    Err(QueueError::Shutdown { .. }) => break ExitReason::Shutdown,
                    Err(error) => {
                        tracing::warn!(worker = id, %error, "produce failed");
                        break ExitReason::Shutdown;
                    }
                },
            }
        };
        let _ = state_tx.send(WorkerState::Draining);
        tracing::debug!(worker = id, produced, ?reason, "producer stopping");
        let _ = state_tx.send(WorkerState::Stopped);
        WorkerReport {
            id,
            processed: produced,
            reason,
        }
    });
    WorkerHandle { id, state_rx, join }
}

/// Spawns a consumer that feeds each received item to `handler`
///
/// Runs until the token fires or the buffer shuts down and is drained. A
/// handler already running when the stop condition arrives finishes its item
/// before the loop-boundary check ends the loop.
pub fn spawn_consumer<T, B, F, Fut>(
    id: usize,
    buffer: Arc<B>,
    token: CancelToken,
    mut handler: F,
) -> WorkerHandle
where
    T: Send + 'static,
    B: SlotBuffer<T> + 'static,
    F: FnMut(T) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let (state_tx, state_rx) = watch::channel(WorkerState::Running);
    let join = tokio::spawn(async move {
        tracing::debug!(worker = id, "consumer running");
        let mut consumed = 0u64;
        let reason = loop {
            if token.is_cancelled() {
                break ExitReason::Cancelled;
            }
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::warn!(worker = id, "cancelled with a consume in flight");
                    break ExitReason::Cancelled;
                }
                result = buffer.consume() => match result {
                    Ok(item) => {
                        handler(item).await;
                        consumed += 1;
                    }
                    Err(QueueError::Shutdown { .. }) => break ExitReason::Shutdown,
                    Err(error) => {
                        tracing::warn!(worker = id, %error, "consume failed");
                        break ExitReason::Shutdown;
                    }
                },
            }
        };
        let _ = state_tx.send(WorkerState::Draining);
        tracing::debug!(worker = id, consumed, ?reason, "consumer stopping");
        let _ = state_tx.send(WorkerState::Stopped);
        WorkerReport {
            id,
            processed: consumed,
            reason,
        }
    });
    WorkerHandle { id, state_rx, join }
}

/// Spawns a consumer that polls with a bounded wait instead of blocking
///
/// Each `consume_timeout(period)` that times out is an expected outcome: the
/// worker re-checks its token and tries again. Useful when the consumer has
/// periodic work to do besides draining the buffer, and the pattern that
/// keeps a consumer responsive even on backends without shutdown wakeups.
pub fn spawn_polling_consumer<T, B, F, Fut>(
    id: usize,
    buffer: Arc<B>,
    token: CancelToken,
    period: Duration,
    mut handler: F,
) -> WorkerHandle
where
    T: Send + 'static,
    B: SlotBuffer<T> + 'static,
    F: FnMut(T) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let (state_tx, state_rx) = watch::channel(WorkerState::Running);
    let join = tokio::spawn(async move {
        tracing::debug!(worker = id, period_ms = period.as_millis() as u64, "polling consumer running");
        let mut consumed = 0u64;
        let reason = loop {
            if token.is_cancelled() {
                break ExitReason::Cancelled;
            }
            match buffer.consume_timeout(period).await {
                Ok(item) => {
                    handler(item).await;
                    consumed += 1;
                }
                // Timed out: re-check the token at the loop boundary and retry.
                Err(QueueError::ConsumeTimeout { .. }) => continue,
                Err(QueueError::Shutdown { .. }) => break ExitReason::Shutdown,
                Err(error) => {
                    tracing::warn!(worker = id, %error, "consume failed");
                    break ExitReason::Shutdown;
                }
            }
        };
        let _ = state_tx.send(WorkerState::Draining);
        tracing::debug!(worker = id, consumed, ?reason, "polling consumer stopping");
        let _ = state_tx.send(WorkerState::Stopped);
        WorkerReport {
            id,
            processed: consumed,
            reason,
        }
    });
    WorkerHandle { id, state_rx, join }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{BufferCfg, SlotQueue, SyncStrategy};
    use crate::cancel::cancel_pair;
    use std::sync::Mutex;

    fn queue(capacity: usize) -> Arc<SlotQueue<u32>> {
        Arc::new(SlotQueue::new(&BufferCfg::new(capacity, SyncStrategy::Monitor)).unwrap())
    }

    #[tokio::test]
    async fn test_producer_completes_and_reports_count() {
        let buffer = queue(10);
        let (_handle, token) = cancel_pair();

        let producer = spawn_producer(1, Arc::clone(&buffer), 0..5u32, token);
        let report = producer.join().await.unwrap();

        assert_eq!(report.id, 1);
        assert_eq!(report.processed, 5);
        assert_eq!(report.reason, ExitReason::Completed);
        assert_eq!(buffer.len(), 5);
    }

    #[tokio::test]
    async fn test_consumer_receives_everything_then_drains_on_shutdown() {
        let buffer = queue(4);
        let (_handle, token) = cancel_pair();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let consumer = spawn_consumer(2, Arc::clone(&buffer), token, move |item| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(item);
            }
        });

        for i in 0..8u32 {
            buffer.produce(i).await.unwrap();
        }
        buffer.shutdown();

        let report = consumer.join().await.unwrap();
        assert_eq!(report.processed, 8);
        assert_eq!(report.reason, ExitReason::Shutdown);
        assert_eq!(*seen.lock().unwrap(), (0..8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_blocked_consumer_reacts_to_cancellation() {
        let buffer = queue(4);
        let (handle, token) = cancel_pair();

        let consumer = spawn_consumer(3, Arc::clone(&buffer), token, |_item: u32| async {});
        tokio::task::yield_now().await;
        assert_eq!(consumer.state(), WorkerState::Running);

        handle.cancel();
        let report = consumer.join().await.unwrap();
        assert_eq!(report.reason, ExitReason::Cancelled);
        assert_eq!(report.processed, 0);
        // Cancellation of a blocked consume removed nothing.
        assert_eq!(buffer.len(), 0);
    }

    #[tokio::test]
    async fn test_blocked_producer_reacts_to_cancellation() {
        let buffer = queue(1);
        buffer.produce(0).await.unwrap();
        let (handle, token) = cancel_pair();

        let producer = spawn_producer(4, Arc::clone(&buffer), 1..100u32, token);
        tokio::task::yield_now().await;

        handle.cancel();
        let report = producer.join().await.unwrap();
        assert_eq!(report.reason, ExitReason::Cancelled);
        // The blocked produce did not enqueue.
        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_consumer_retries_until_cancelled() {
        let buffer = queue(4);
        let (handle, token) = cancel_pair();

        let consumer = spawn_polling_consumer(
            5,
            Arc::clone(&buffer),
            token,
            Duration::from_millis(50),
            |_item: u32| async {},
        );

        // Let it cycle through a few timeouts on virtual time.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!consumer.is_finished());

        handle.cancel();
        let report = consumer.join().await.unwrap();
        assert_eq!(report.reason, ExitReason::Cancelled);
    }

    #[tokio::test]
    async fn test_handle_state_reaches_stopped() {
        let buffer = queue(4);
        let (_handle, token) = cancel_pair();

        let producer = spawn_producer(6, Arc::clone(&buffer), 0..1u32, token);
        while !producer.is_finished() {
            tokio::task::yield_now().await;
        }
        assert_eq!(producer.state(), WorkerState::Stopped);

        let report = producer.join().await.unwrap();
        assert_eq!(report.reason, ExitReason::Completed);
    }
}
