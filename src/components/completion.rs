// Single-fulfillment bridge between OS completion handlers and blocking workers
//
// Apple's completion handlers run on framework-owned queues. The handle below is
// captured by those handlers; the waiter stays with the worker that issued the
// OS call and parks it until the first fulfillment arrives.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Sending half of a completion. Cheap to clone; only the first
/// [`Completion::fulfill`] across all clones is delivered.
pub struct Completion<T> {
    slot: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> std::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("fulfilled", &self.is_fulfilled())
            .finish()
    }
}

impl<T> Completion<T> {
    pub fn channel() -> (Completion<T>, CompletionWaiter<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Completion {
                slot: Arc::new(Mutex::new(Some(tx))),
            },
            CompletionWaiter { rx },
        )
    }

    /// Delivers `value` to the waiter. Returns `false` if a value was
    /// already delivered; the late value is dropped.
    pub fn fulfill(&self, value: T) -> bool {
        match self.slot.lock().take() {
            Some(sender) => {
                // The waiter may have given up (timeout); that still counts as
                // the one fulfillment.
                let _ = sender.send(value);
                true
            },
            None => {
                tracing::warn!("Completion handler invoked more than once, ignoring late result");
                false
            },
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        self.slot.lock().is_none()
    }
}

/// Why a blocking wait ended without a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WaitError {
    #[error("completion handler was released without being called")]
    Dropped,
    #[error("completion handler did not respond within {}ms", .0.as_millis())]
    TimedOut(Duration),
}

/// Receiving half of a completion, owned by the worker that issued the call.
#[derive(Debug)]
pub struct CompletionWaiter<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> CompletionWaiter<T> {
    /// Parks the current thread until the completion is fulfilled.
    ///
    /// Must be called from a blocking context (`spawn_blocking` or a plain
    /// thread), never from inside an async task. With `timeout == None` the
    /// wait is unbounded.
    pub fn wait(self, timeout: Option<Duration>) -> Result<T, WaitError> {
        let Some(limit) = timeout else {
            return self.rx.blocking_recv().map_err(|_| WaitError::Dropped);
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => match handle.block_on(tokio::time::timeout(limit, self.rx)) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(_)) => Err(WaitError::Dropped),
                Err(_elapsed) => Err(WaitError::TimedOut(limit)),
            },
            Err(_) => {
                tracing::debug!("No runtime available for a bounded wait, waiting without timeout");
                self.rx.blocking_recv().map_err(|_| WaitError::Dropped)
            },
        }
    }
}
