// Capable backend: permission gateway and notification dispatcher over a
// NotificationCenter

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::task::JoinError;

use crate::components::completion::WaitError;
use crate::components::{
    AuthorizationState, BoxFuture, CallbackRegistry, ClickCallback, Completion, NativeNotifier,
    NotificationCenter, NotificationContent, NotificationRequest, NotificationResult,
    NotifierConfig, NotifyResult, PermissionStatus,
};

/// Why an OS call issued on a worker produced no value.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Wait(#[from] WaitError),
    #[error("notification worker failed: {0}")]
    Worker(#[from] JoinError),
}

/// Latest in-flight submission per identifier. A submission that fails
/// only cleans up on the OS side while no newer one has claimed its
/// identifier.
#[derive(Debug, Default)]
struct Submissions {
    latest: Mutex<HashMap<String, u64>>,
    next: AtomicU64,
}

impl Submissions {
    fn begin(&self, identifier: &str) -> u64 {
        let generation = self.next.fetch_add(1, Ordering::Relaxed);
        self.latest.lock().insert(identifier.to_string(), generation);
        generation
    }

    /// Ends `generation`. Returns whether it still owned `identifier`.
    fn finish(&self, identifier: &str, generation: u64) -> bool {
        let mut latest = self.latest.lock();
        if latest.get(identifier) == Some(&generation) {
            latest.remove(identifier);
            true
        } else {
            false
        }
    }
}

/// Notifier backed by an OS notification center.
///
/// Every OS-facing operation is issued from a `tokio` blocking worker that
/// parks until the OS completion handler fires, so the returned futures must
/// be polled inside a `tokio` runtime.
pub struct Notifier<C: NotificationCenter> {
    center: Arc<C>,
    registry: Arc<CallbackRegistry>,
    submissions: Submissions,
    config: NotifierConfig,
}

impl<C: NotificationCenter> Notifier<C> {
    pub fn new(center: C) -> Self {
        Self::with_config(center, NotifierConfig::default())
    }

    pub fn with_config(center: C, config: NotifierConfig) -> Self {
        let center = Arc::new(center);
        let registry = Arc::new(CallbackRegistry::new());
        center.attach_registry(Arc::clone(&registry));

        Self {
            center,
            registry,
            submissions: Submissions::default(),
            config,
        }
    }

    pub fn center(&self) -> &C {
        &self.center
    }

    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Issues `call` on a blocking worker and parks that worker until the
    /// completion is fulfilled (or the configured timeout elapses).
    async fn bridge<T, F>(&self, call: F) -> Result<T, BridgeError>
    where
        T: Send + 'static,
        F: FnOnce(&C, Completion<T>) + Send + 'static,
    {
        let center = Arc::clone(&self.center);
        let timeout = self.config.completion_timeout;

        let waited = tokio::task::spawn_blocking(move || {
            let (completion, waiter) = Completion::channel();
            call(&center, completion);
            waiter.wait(timeout)
        })
        .await?;

        Ok(waited?)
    }

    fn build_content(&self, options: NotificationRequest, identifier: &str) -> NotificationContent {
        let image = options
            .content_image
            .as_deref()
            .and_then(|path| resolve_image(path, identifier));

        NotificationContent {
            identifier: identifier.to_string(),
            title: options.title,
            subtitle: options.subtitle,
            body: options.body,
            sound: options.sound,
            image,
            user_info: options.user_info,
        }
    }
}

/// Accepts an attachment path only if it is absolute and exists. Anything
/// else is logged and the notification goes out without an image.
fn resolve_image(path: &Path, identifier: &str) -> Option<PathBuf> {
    if !path.is_absolute() {
        tracing::warn!(
            identifier = %identifier,
            path = %path.display(),
            "contentImage must be an absolute path, showing notification without image"
        );
        return None;
    }
    if !path.exists() {
        tracing::warn!(
            identifier = %identifier,
            path = %path.display(),
            "contentImage file does not exist, showing notification without image"
        );
        return None;
    }
    Some(path.to_path_buf())
}

impl<C: NotificationCenter> NativeNotifier for Notifier<C> {
    fn is_available(&self) -> bool {
        true
    }

    fn request_permission(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            match self
                .bridge(|center, done| center.request_authorization(done))
                .await
            {
                Ok(granted) => granted,
                Err(error) => {
                    tracing::warn!(%error, "Permission request did not complete");
                    false
                },
            }
        })
    }

    fn get_permission_status(&self) -> BoxFuture<'_, PermissionStatus> {
        Box::pin(async move {
            match self
                .bridge(|center, done| center.authorization_state(done))
                .await
            {
                Ok(state) => state.permission_status(),
                Err(error) => {
                    tracing::warn!(%error, "Permission status query did not complete");
                    AuthorizationState::NotDetermined.permission_status()
                },
            }
        })
    }

    fn show_notification(
        &self,
        options: NotificationRequest,
        callback: Option<ClickCallback>,
    ) -> NotifyResult<BoxFuture<'_, NotificationResult>> {
        options.validate()?;

        let identifier = options.resolve_identifier();
        let submission = self.submissions.begin(&identifier);
        let registration = callback.map(|callback| {
            self.registry
                .register(identifier.clone(), callback, options.user_info.clone())
        });
        let content = self.build_content(options, &identifier);

        Ok(Box::pin(async move {
            tracing::debug!(identifier = %identifier, "Submitting notification request");

            let outcome = self
                .bridge(move |center, done| center.add_request(content, done))
                .await;
            let still_latest = self.submissions.finish(&identifier, submission);

            let failure = match outcome {
                Ok(Ok(())) => return NotificationResult::delivered(identifier),
                Ok(Err(message)) => {
                    tracing::debug!(identifier = %identifier, %message, "Notification request rejected");
                    message
                },
                Err(error) => {
                    tracing::warn!(
                        identifier = %identifier,
                        %error,
                        "Notification request did not complete, cancelling"
                    );
                    // A late OS acceptance must not leave a ghost notification.
                    if still_latest {
                        self.center.remove(&identifier);
                    } else {
                        tracing::debug!(
                            identifier = %identifier,
                            "Newer notification owns the identifier, leaving it in place"
                        );
                    }
                    error.to_string()
                },
            };

            if let Some(token) = registration {
                self.registry.evict_if(&identifier, token);
            }
            NotificationResult::failed(failure)
        }))
    }

    fn remove_notification(&self, identifier: &str) {
        if self.registry.evict(identifier) {
            tracing::debug!(identifier = %identifier, "Released pending callback on removal");
        }
        self.center.remove(identifier);
    }

    fn remove_all_notifications(&self) {
        let released = self.registry.clear();
        tracing::debug!(released, "Removing all notifications");
        self.center.remove_all();
    }
}
