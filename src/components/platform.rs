// Platform contracts: the caller-facing notifier interface and the OS seam
// underneath the capable backend

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    CallbackRegistry, ClickCallback, Completion, NotificationResult, NotifyResult,
    PermissionStatus,
};

pub type BoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// One fixed contract for showing, querying and removing notifications.
///
/// Implemented by [`crate::Notifier`] over a real notification center and by
/// [`crate::StubNotifier`] on platforms without one.
pub trait NativeNotifier: Send + Sync {
    fn is_available(&self) -> bool;

    /// Prompts the user (if undecided) for alert, sound and badge
    /// authorization. Resolves `true` iff granted.
    fn request_permission(&self) -> BoxFuture<'_, bool>;

    /// Current authorization without prompting.
    fn get_permission_status(&self) -> BoxFuture<'_, PermissionStatus>;

    /// Validates `options` synchronously, then returns a future resolving
    /// the OS outcome. Input errors are the only `Err`.
    fn show_notification(
        &self,
        options: super::NotificationRequest,
        callback: Option<ClickCallback>,
    ) -> NotifyResult<BoxFuture<'_, NotificationResult>>;

    /// Fire-and-forget removal of delivered and pending notifications with
    /// `identifier`; releases its pending callback.
    fn remove_notification(&self, identifier: &str);

    fn remove_all_notifications(&self);
}

/// Authorization states as reported by the OS, before collapsing into
/// [`PermissionStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorizationState {
    NotDetermined,
    Denied,
    Authorized,
    Provisional,
    Ephemeral,
    /// A raw value this crate does not know about.
    Unknown(i64),
}

impl AuthorizationState {
    /// Maps a raw `UNAuthorizationStatus` value.
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            0 => AuthorizationState::NotDetermined,
            1 => AuthorizationState::Denied,
            2 => AuthorizationState::Authorized,
            3 => AuthorizationState::Provisional,
            4 => AuthorizationState::Ephemeral,
            other => AuthorizationState::Unknown(other),
        }
    }

    pub fn permission_status(self) -> PermissionStatus {
        match self {
            AuthorizationState::Authorized | AuthorizationState::Provisional => {
                PermissionStatus::Granted
            },
            AuthorizationState::Denied => PermissionStatus::Denied,
            AuthorizationState::NotDetermined
            | AuthorizationState::Ephemeral
            | AuthorizationState::Unknown(_) => PermissionStatus::NotDetermined,
        }
    }
}

impl From<AuthorizationState> for PermissionStatus {
    fn from(state: AuthorizationState) -> Self {
        state.permission_status()
    }
}

/// Platform-neutral notification content handed to the OS seam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    pub identifier: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub body: Option<String>,
    pub sound: bool,
    /// Verified to exist when the content was built.
    pub image: Option<PathBuf>,
    /// Opaque caller payload, carried by the OS alongside the notification.
    pub user_info: Option<String>,
}

/// Asynchronous OS notification center.
///
/// Every method returns immediately. Operations with a result fulfill the
/// given [`Completion`] later, from whatever thread the OS chooses.
pub trait NotificationCenter: Send + Sync + 'static {
    fn request_authorization(&self, completion: Completion<bool>);

    fn authorization_state(&self, completion: Completion<AuthorizationState>);

    /// Submits `content` with an immediate trigger. Fulfills `Err` with the
    /// OS-provided message when the request is rejected.
    fn add_request(&self, content: NotificationContent, completion: Completion<Result<(), String>>);

    /// Removes delivered and pending notifications with `identifier`.
    fn remove(&self, identifier: &str);

    fn remove_all(&self);

    /// Routes click events for this center into `registry`.
    fn attach_registry(&self, registry: Arc<CallbackRegistry>);
}

impl<C: NotificationCenter + ?Sized> NotificationCenter for Arc<C> {
    fn request_authorization(&self, completion: Completion<bool>) {
        (**self).request_authorization(completion)
    }

    fn authorization_state(&self, completion: Completion<AuthorizationState>) {
        (**self).authorization_state(completion)
    }

    fn add_request(&self, content: NotificationContent, completion: Completion<Result<(), String>>) {
        (**self).add_request(content, completion)
    }

    fn remove(&self, identifier: &str) {
        (**self).remove(identifier)
    }

    fn remove_all(&self) {
        (**self).remove_all()
    }

    fn attach_registry(&self, registry: Arc<CallbackRegistry>) {
        (**self).attach_registry(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisional_counts_as_granted() {
        let cases = [
            (AuthorizationState::NotDetermined, PermissionStatus::NotDetermined),
            (AuthorizationState::Denied, PermissionStatus::Denied),
            (AuthorizationState::Authorized, PermissionStatus::Granted),
            (AuthorizationState::Provisional, PermissionStatus::Granted),
            (AuthorizationState::Ephemeral, PermissionStatus::NotDetermined),
            (AuthorizationState::Unknown(42), PermissionStatus::NotDetermined),
        ];
        for (state, expected) in cases {
            assert_eq!(PermissionStatus::from(state), expected, "{state:?}");
        }
    }

    #[test]
    fn raw_status_values() {
        assert_eq!(AuthorizationState::from_raw(0), AuthorizationState::NotDetermined);
        assert_eq!(AuthorizationState::from_raw(3), AuthorizationState::Provisional);
        assert_eq!(AuthorizationState::from_raw(4), AuthorizationState::Ephemeral);
        assert_eq!(AuthorizationState::from_raw(-1), AuthorizationState::Unknown(-1));
    }
}
