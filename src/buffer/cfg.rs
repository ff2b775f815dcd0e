//! Buffer configuration types
//!
//! Defines the configuration struct for selecting capacity and
//! synchronization strategy at construction time.

use core::fmt;

/// Synchronization strategy backing a [`SlotQueue`](crate::SlotQueue)
///
/// All four strategies implement the same contract: producers block while the
/// buffer is full, consumers block while it is empty, items come out in FIFO
/// order, and `shutdown()` wakes every blocked caller. They differ only in
/// the primitives used to get there, which makes them useful for comparing
/// behavior and for picking the trade-off you want.
///
/// # Quick Selection Guide
/// - **Default / simplest**: `Monitor`, one lock, two wakers, the classic
///   condition-wait loop
/// - **Classic PV semantics**: `Semaphore`, an empty/full counting-semaphore
///   pair around a small critical section
/// - **Deadline-heavy callers**: `TimedLock` bounds the *total* wait of a
///   timed call natively instead of wrapping the whole operation
/// - **Thin facade**: `ManagedQueue` delegates to a ready-made MPMC channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SyncStrategy {
    /// Mutex plus two notify wakers (`not_full`, `not_empty`)
    ///
    /// The condition is always re-checked in a loop after waking, so spurious
    /// wakeups and waiters racing for the same slot are harmless.
    Monitor,

    /// Counting-semaphore pair (`empty` and `full`) plus a mutex
    ///
    /// The empty/full permit is acquired before the critical-section mutex.
    /// That ordering is load-bearing: taking the mutex first deadlocks as
    /// soon as a producer and a consumer block at the same time.
    Semaphore,

    /// Explicit async lock with deadline-armed waits
    ///
    /// Same shape as `Monitor`, but each park is bounded by the caller's
    /// deadline, so a timed call never overshoots its budget across retries.
    TimedLock,

    /// Delegate to a ready-made bounded MPMC channel
    ///
    /// Fairness follows the channel's own wakeup policy.
    ManagedQueue,
}

impl SyncStrategy {
    /// Returns a short lowercase name for this strategy
    pub fn name(&self) -> &'static str {
        match self {
            SyncStrategy::Monitor => "monitor",
            SyncStrategy::Semaphore => "semaphore",
            SyncStrategy::TimedLock => "timed_lock",
            SyncStrategy::ManagedQueue => "managed_queue",
        }
    }

    /// All strategies, in a fixed order
    ///
    /// Handy for running the same scenario against every backend.
    pub const ALL: [SyncStrategy; 4] = [
        SyncStrategy::Monitor,
        SyncStrategy::Semaphore,
        SyncStrategy::TimedLock,
        SyncStrategy::ManagedQueue,
    ];
}

/// Buffer configuration: fixed capacity plus synchronization strategy
///
/// # Examples
/// ```rust
/// use slotq::{BufferCfg, SyncStrategy};
///
/// let cfg = BufferCfg::new(5, SyncStrategy::Semaphore);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BufferCfg {
    /// Maximum number of items the buffer may hold
    pub capacity: usize,
    /// Synchronization strategy backing the buffer
    pub strategy: SyncStrategy,
}

impl BufferCfg {
    /// Creates a configuration with the given capacity and strategy
    pub fn new(capacity: usize, strategy: SyncStrategy) -> Self {
        Self { capacity, strategy }
    }

    /// Validates the configuration
    ///
    /// Returns `Err` if capacity is 0. A zero-capacity buffer could never
    /// satisfy a `produce`, so it is rejected up front rather than deadlocking
    /// the first caller.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.capacity == 0 {
            return Err("buffer capacity must be > 0");
        }
        Ok(())
    }

    /// Returns the strategy's short name
    pub fn name(&self) -> &'static str {
        self.strategy.name()
    }
}

impl Default for BufferCfg {
    /// Returns the default configuration: `Monitor` with capacity 16
    fn default() -> Self {
        BufferCfg {
            capacity: 16,
            strategy: SyncStrategy::Monitor,
        }
    }
}

impl fmt::Display for BufferCfg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(capacity={})", self.name(), self.capacity)
    }
}
