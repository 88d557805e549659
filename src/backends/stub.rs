// Inert facade for platforms without UserNotifications

use crate::components::{
    BoxFuture, ClickCallback, NativeNotifier, NotificationRequest, NotificationResult,
    NotifyResult, PermissionStatus,
};

pub const UNAVAILABLE_MESSAGE: &str = "Native notifications not available on this platform";

/// Same contract as [`crate::Notifier`], with fixed negative results and no
/// side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubNotifier;

impl StubNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl NativeNotifier for StubNotifier {
    fn is_available(&self) -> bool {
        false
    }

    fn request_permission(&self) -> BoxFuture<'_, bool> {
        Box::pin(async { false })
    }

    fn get_permission_status(&self) -> BoxFuture<'_, PermissionStatus> {
        Box::pin(async { PermissionStatus::Denied })
    }

    fn show_notification(
        &self,
        _options: NotificationRequest,
        _callback: Option<ClickCallback>,
    ) -> NotifyResult<BoxFuture<'_, NotificationResult>> {
        Ok(Box::pin(async {
            NotificationResult::failed(UNAVAILABLE_MESSAGE)
        }))
    }

    fn remove_notification(&self, _identifier: &str) {}

    fn remove_all_notifications(&self) {}
}
