mod common;

use std::sync::Arc;
use std::time::Duration;

use common::FakeCenter;
use native_notify::*;

#[tokio::test]
async fn request_permission_reports_user_choice() {
    let center = FakeCenter::new();
    let notifier = Notifier::new(Arc::clone(&center));

    assert!(notifier.request_permission().await);

    center.set_grant(false);
    assert!(!notifier.request_permission().await);
}

#[tokio::test]
async fn status_covers_every_authorization_state() {
    let center = FakeCenter::new();
    let notifier = Notifier::new(Arc::clone(&center));

    let cases = [
        (AuthorizationState::NotDetermined, PermissionStatus::NotDetermined),
        (AuthorizationState::Denied, PermissionStatus::Denied),
        (AuthorizationState::Authorized, PermissionStatus::Granted),
        (AuthorizationState::Provisional, PermissionStatus::Granted),
        (AuthorizationState::Ephemeral, PermissionStatus::NotDetermined),
        (AuthorizationState::Unknown(99), PermissionStatus::NotDetermined),
    ];

    for (state, expected) in cases {
        center.set_authorization(state);
        assert_eq!(notifier.get_permission_status().await, expected, "{state:?}");
    }
}

/// Never answers authorization queries.
struct SilentCenter;

impl NotificationCenter for SilentCenter {
    fn request_authorization(&self, completion: Completion<bool>) {
        std::mem::forget(completion);
    }

    fn authorization_state(&self, completion: Completion<AuthorizationState>) {
        std::mem::forget(completion);
    }

    fn add_request(&self, _content: NotificationContent, completion: Completion<Result<(), String>>) {
        // Dropping the handle without answering releases the waiter.
        drop(completion);
    }

    fn remove(&self, _identifier: &str) {}

    fn remove_all(&self) {}

    fn attach_registry(&self, _registry: Arc<CallbackRegistry>) {}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn bounded_waits_fall_back_to_negative_answers() {
    let notifier = Notifier::with_config(
        SilentCenter,
        NotifierConfig::default().with_completion_timeout(Duration::from_millis(40)),
    );

    assert!(!notifier.request_permission().await);
    assert_eq!(
        notifier.get_permission_status().await,
        PermissionStatus::NotDetermined
    );
}

#[tokio::test]
async fn released_completion_resolves_show_as_failure() -> anyhow::Result<()> {
    let notifier = Notifier::new(SilentCenter);

    let result = notifier
        .show_notification(NotificationRequest::new("Lost"), None)?
        .await;

    assert!(!result.success);
    assert!(result.error.is_some());
    Ok(())
}

#[test]
fn permission_status_strings() {
    assert_eq!(PermissionStatus::Granted.to_string(), "granted");
    assert_eq!(PermissionStatus::Denied.to_string(), "denied");
    assert_eq!(PermissionStatus::NotDetermined.to_string(), "notDetermined");
    assert_eq!(
        serde_json::to_string(&PermissionStatus::NotDetermined).unwrap(),
        r#""notDetermined""#
    );
}
