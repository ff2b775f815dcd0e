//! Bounded-buffer contract and its synchronization backends
//!
//! One contract, four interchangeable implementations:
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │              SlotBuffer<T> (trait)             │
//! │  produce / consume / timed / try / shutdown    │
//! └───────┬──────────┬──────────┬──────────┬───────┘
//!         │          │          │          │
//!         ▼          ▼          ▼          ▼
//!   MonitorBuffer  SemaphoreBuffer  TimedLockBuffer  ChannelBuffer
//!   (mutex + two   (empty/full      (explicit lock,  (bounded MPMC
//!    wakers)        permit pair)     deadline waits)  channel facade)
//! ```
//!
//! [`SlotQueue`] wraps all four behind one concrete type, selected from
//! [`BufferCfg`] at construction. The property suite in `tests/` runs against
//! the trait, so each backend is independently verifiable against the same
//! contract.

mod cfg;
mod channel;
mod monitor;
mod queue;
mod semaphore;
mod timed_lock;
mod traits;

pub use cfg::{BufferCfg, SyncStrategy};
pub use channel::ChannelBuffer;
pub use monitor::MonitorBuffer;
pub use queue::SlotQueue;
pub use semaphore::SemaphoreBuffer;
pub use timed_lock::TimedLockBuffer;
pub use traits::SlotBuffer;
