//! Cooperative cancellation.
//!
//! A [`CancelSignal`] is shared by every request context a service creates.
//! Triggering it flips a flag that long-running handlers can poll or await,
//! allowing in-flight work to wind down without the service tearing the
//! connection out from under it.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::broadcast;

use crate::handler::BoxFuture;

/// A signal that can be triggered once and observed by many tasks.
///
/// `CancelSignal` can be cloned and shared freely; all clones observe the
/// same state. Triggering is idempotent.
///
/// # Example
///
/// ```rust
/// use daedalus_core::CancelSignal;
///
/// let cancel = CancelSignal::new();
/// assert!(!cancel.is_cancelled());
///
/// cancel.cancel();
/// assert!(cancel.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancelSignal {
    /// Whether cancellation has been triggered
    triggered: Arc<AtomicBool>,

    /// Broadcast sender for notifying waiters
    sender: broadcast::Sender<()>,
}

impl CancelSignal {
    /// Creates a new, untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            sender,
        }
    }

    /// Triggers cancellation, notifying all waiting tasks.
    ///
    /// Calling this more than once has no further effect.
    pub fn cancel(&self) {
        // Only trigger once
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            // Ignore error if no receivers
            let _ = self.sender.send(());
        }
    }

    /// Returns `true` if cancellation has been triggered.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Returns a future that completes when cancellation is triggered.
    ///
    /// If the signal was already triggered, the future completes on its
    /// first poll.
    #[must_use]
    pub fn listen(&self) -> CancelListener {
        let triggered = Arc::clone(&self.triggered);
        let mut receiver = self.sender.subscribe();
        CancelListener {
            inner: Box::pin(async move {
                // Fast path: already triggered
                if triggered.load(Ordering::SeqCst) {
                    return;
                }
                // Any outcome means the sender fired or went away
                let _ = receiver.recv().await;
            }),
        }
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// A future that completes when the owning [`CancelSignal`] is triggered.
///
/// Created by [`CancelSignal::listen()`].
pub struct CancelListener {
    inner: BoxFuture<'static, ()>,
}

impl Future for CancelListener {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl std::fmt::Debug for CancelListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelListener").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_untriggered() {
        let cancel = CancelSignal::new();
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let cancel = CancelSignal::new();
        cancel.cancel();
        cancel.cancel();
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_clones_share_state() {
        let cancel = CancelSignal::new();
        let clone = cancel.clone();

        clone.cancel();
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_listener_wakes_on_cancel() {
        let cancel = CancelSignal::new();
        let mut listener = tokio_test::task::spawn(cancel.listen());

        tokio_test::assert_pending!(listener.poll());

        cancel.cancel();
        assert!(listener.is_woken());
        tokio_test::assert_ready!(listener.poll());
    }

    #[tokio::test]
    async fn test_listener_completes_when_already_cancelled() {
        let cancel = CancelSignal::new();
        cancel.cancel();

        cancel.listen().await;
    }
}
