// Identifier-keyed table of pending click callbacks
//
// One lock guards the whole table. Callbacks are always invoked or dropped
// after the lock is released so a callback may call back into the notifier.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::runtime::Handle;

use super::NotificationEvent;

/// Caller-supplied click handler: receives the event kind and the opaque
/// `userInfo` that was attached when the notification was shown.
pub type ClickCallback = Box<dyn FnOnce(NotificationEvent, Option<String>) + Send + 'static>;

/// Identifies one registration so a caller can later release its own entry
/// without touching a newer one for the same identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationToken(u64);

struct PendingCallback {
    token: RegistrationToken,
    callback: ClickCallback,
    user_info: Option<String>,
    /// Runtime of the caller that registered the callback, if any.
    runtime: Option<Handle>,
}

impl PendingCallback {
    fn invoke(self, event: NotificationEvent, payload: Option<String>) {
        let delivery = Delivery {
            callback: Some(self.callback),
            event,
            user_info: payload.or(self.user_info),
        };
        match self.runtime {
            Some(handle) => {
                handle.spawn(async move { delivery.run() });
            },
            None => delivery.run(),
        }
    }
}

/// A callback on its way to the caller. If the task carrying it is dropped
/// before it runs (the caller's runtime has shut down), the callback runs
/// inline on the dropping thread instead.
struct Delivery {
    callback: Option<ClickCallback>,
    event: NotificationEvent,
    user_info: Option<String>,
}

impl Delivery {
    fn run(mut self) {
        self.deliver();
    }

    fn deliver(&mut self) -> bool {
        match self.callback.take() {
            Some(callback) => {
                callback(self.event, self.user_info.take());
                true
            },
            None => false,
        }
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        if self.callback.is_some() {
            tracing::debug!(event = ?self.event, "Caller runtime gone, delivering callback inline");
            self.deliver();
        }
    }
}

/// Pending click callbacks, at most one per notification identifier.
#[derive(Default)]
pub struct CallbackRegistry {
    pending: Mutex<HashMap<String, PendingCallback>>,
    next_token: AtomicU64,
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("pending", &self.len())
            .finish()
    }
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for `identifier`. A callback already pending for
    /// the same identifier is released without being invoked.
    pub fn register(
        &self,
        identifier: impl Into<String>,
        callback: ClickCallback,
        user_info: Option<String>,
    ) -> RegistrationToken {
        let identifier = identifier.into();
        let token = RegistrationToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let entry = PendingCallback {
            token,
            callback,
            user_info,
            runtime: Handle::try_current().ok(),
        };

        let previous = self.pending.lock().insert(identifier.clone(), entry);
        let evicted = previous.is_some();
        drop(previous);

        if evicted {
            tracing::debug!(identifier = %identifier, "Replaced pending notification callback");
        } else {
            tracing::debug!(identifier = %identifier, "Registered notification callback");
        }
        token
    }

    /// Removes the entry for `identifier` and invokes its callback once with
    /// `event`. Returns `false` (and does nothing) if nothing was pending.
    pub fn dispatch(&self, identifier: &str, event: NotificationEvent) -> bool {
        self.dispatch_with_user_info(identifier, event, None)
    }

    /// Like [`dispatch`](Self::dispatch), but hands the callback `user_info`
    /// when one is given (the payload the OS carried with the notification)
    /// instead of the copy stored at registration.
    pub fn dispatch_with_user_info(
        &self,
        identifier: &str,
        event: NotificationEvent,
        user_info: Option<String>,
    ) -> bool {
        let entry = self.pending.lock().remove(identifier);
        match entry {
            Some(entry) => {
                tracing::debug!(identifier = %identifier, ?event, "Delivering notification event");
                entry.invoke(event, user_info);
                true
            },
            None => {
                tracing::trace!(identifier = %identifier, "No callback pending, event dropped");
                false
            },
        }
    }

    /// Releases the callback for `identifier` without invoking it.
    pub fn evict(&self, identifier: &str) -> bool {
        let entry = self.pending.lock().remove(identifier);
        entry.is_some()
    }

    /// Releases the callback for `identifier` only if it is still the one
    /// registered under `token`.
    pub fn evict_if(&self, identifier: &str, token: RegistrationToken) -> bool {
        let entry = {
            let mut pending = self.pending.lock();
            match pending.get(identifier) {
                Some(entry) if entry.token == token => pending.remove(identifier),
                _ => None,
            }
        };
        entry.is_some()
    }

    /// Releases every pending callback without invoking any. Returns how
    /// many were released.
    pub fn clear(&self) -> usize {
        let drained = std::mem::take(&mut *self.pending.lock());
        drained.len()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.pending.lock().contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
