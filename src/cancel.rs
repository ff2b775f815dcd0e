//! Cooperative cancellation
//!
//! An explicitly passed token replaces the usual global shutdown flag: the
//! side that decides holds a [`CancelHandle`], every worker gets its own
//! clone of the [`CancelToken`], and nothing lives in process-wide state.
//! Cancellation is monotonic; a fired token never resets.

use tokio::sync::watch;

/// Creates a connected handle/token pair
///
/// Clone the token once per worker. Dropping the handle without calling
/// [`CancelHandle::cancel`] counts as cancellation, so workers cannot be
/// orphaned waiting on a signal nobody can send anymore.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Triggering side of a cancellation pair
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Fires the cancellation signal; idempotent
    pub fn cancel(&self) {
        // send only fails when no receiver is left, which means every
        // observer is already gone.
        let _ = self.tx.send(true);
    }

    /// Creates another token observing this handle
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Observing side of a cancellation pair
///
/// Cheap to clone; all clones observe the same signal.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Non-blocking check, suitable for loop-iteration boundaries
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the token is cancelled
    ///
    /// Intended for racing against a blocking call in `tokio::select!`.
    /// Resolves immediately if the token already fired, or if the handle
    /// was dropped.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // Err means the handle is gone, which we treat as cancelled.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}
