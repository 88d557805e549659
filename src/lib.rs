//! macOS notifications with image attachments and click callbacks
//!
//! Wraps `UNUserNotificationCenter`: permission request and status, showing
//! notifications with an optional `contentImage` attachment and opaque
//! payload, click callbacks, and removal of delivered or pending
//! notifications. Other platforms get [`StubNotifier`], which honors the same
//! [`NativeNotifier`] contract with inert results.
//!
//! ```no_run
//! use native_notify::{NativeNotifier, NotificationRequest, load_notifier};
//!
//! # async fn demo() -> native_notify::NotifyResult<()> {
//! let notifier = load_notifier();
//! if notifier.request_permission().await {
//!     let request = NotificationRequest::new("Build finished")
//!         .with_body("All 214 tests passed")
//!         .with_content_image("/tmp/preview.png");
//!     let result = notifier
//!         .show_notification(
//!             request,
//!             Some(Box::new(|event, user_info| println!("{event:?} {user_info:?}"))),
//!         )?
//!         .await;
//!     println!("{result:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod components;

pub use backends::*;
pub use components::*;

/// Loads the notifier for this platform with default configuration.
pub fn load_notifier() -> Box<dyn NativeNotifier> {
    load_notifier_with(NotifierConfig::default())
}

/// Loads the notifier for this platform. Never fails: if the capable backend
/// is unavailable the stub facade is returned.
pub fn load_notifier_with(config: NotifierConfig) -> Box<dyn NativeNotifier> {
    PlatformBackendFactory::create_backend(config)
}
