// macOS UserNotifications backend

use std::path::Path;
use std::ptr::NonNull;
use std::sync::{Arc, OnceLock};

use block2::{DynBlock, RcBlock};
use objc2::rc::Retained;
use objc2::runtime::{Bool, NSObject, NSObjectProtocol, ProtocolObject};
use objc2::{AllocAnyThread, DefinedClass, define_class, msg_send};
use objc2_foundation::{NSArray, NSDictionary, NSError, NSString, NSURL};
use objc2_user_notifications::{
    UNAuthorizationOptions, UNMutableNotificationContent, UNNotification,
    UNNotificationAttachment, UNNotificationPresentationOptions, UNNotificationRequest,
    UNNotificationResponse, UNNotificationSettings, UNNotificationSound, UNUserNotificationCenter,
    UNUserNotificationCenterDelegate,
};
use parking_lot::Mutex;

use super::macos_bundle::{self, BundleError};
use crate::components::{
    AuthorizationState, CallbackRegistry, Completion, NotificationCenter, NotificationContent,
    NotificationEvent, NotifierConfig,
};

// =============================================================================
// Compile-Time Thread-Safety Assertions
// =============================================================================

/// Apple invokes completion handlers on its own queues. `block2` blocks are
/// `!Send + !Sync` by default, so every type captured by the blocks below is
/// checked here instead.
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}

    #[allow(dead_code)] // Used for compile-time verification only
    fn _assert_captured_types() {
        assert_send_sync::<Completion<bool>>();
        assert_send_sync::<Completion<AuthorizationState>>();
        assert_send_sync::<Completion<Result<(), String>>>();
    }
};

// =============================================================================
// Delegate
// =============================================================================

struct DelegateIvars {
    registry: Mutex<Option<Arc<CallbackRegistry>>>,
}

define_class!(
    // SAFETY:
    // - NSObject has no subclassing requirements.
    // - NotificationDelegate does not implement Drop.
    #[unsafe(super(NSObject))]
    #[name = "NativeNotifyCenterDelegate"]
    #[ivars = DelegateIvars]
    struct NotificationDelegate;

    unsafe impl NSObjectProtocol for NotificationDelegate {}

    unsafe impl UNUserNotificationCenterDelegate for NotificationDelegate {
        // Foreground notifications are shown anyway, as banner plus sound.
        #[unsafe(method(userNotificationCenter:willPresentNotification:withCompletionHandler:))]
        fn will_present(
            &self,
            _center: &UNUserNotificationCenter,
            _notification: &UNNotification,
            completion_handler: &DynBlock<dyn Fn(UNNotificationPresentationOptions)>,
        ) {
            completion_handler.call((
                UNNotificationPresentationOptions::Banner | UNNotificationPresentationOptions::Sound,
            ));
        }

        #[unsafe(method(userNotificationCenter:didReceiveNotificationResponse:withCompletionHandler:))]
        fn did_receive_response(
            &self,
            _center: &UNUserNotificationCenter,
            response: &UNNotificationResponse,
            completion_handler: &DynBlock<dyn Fn()>,
        ) {
            // SAFETY: a delivered response always carries its notification
            // and originating request.
            let (identifier, user_info) = unsafe {
                let request = response.notification().request();
                (request.identifier(), request.content().userInfo())
            };
            self.deliver_click(&identifier.to_string(), decode_user_info(&user_info));
            completion_handler.call(());
        }
    }
);

// SAFETY: the only ivar is a parking_lot mutex over a Send + Sync value.
unsafe impl Send for NotificationDelegate {}
unsafe impl Sync for NotificationDelegate {}

impl NotificationDelegate {
    fn new() -> Retained<Self> {
        let this = Self::alloc().set_ivars(DelegateIvars {
            registry: Mutex::new(None),
        });
        unsafe { msg_send![super(this), init] }
    }

    fn attach(&self, registry: Arc<CallbackRegistry>) {
        *self.ivars().registry.lock() = Some(registry);
    }

    fn deliver_click(&self, identifier: &str, user_info: Option<String>) {
        let registry = self.ivars().registry.lock().clone();
        match registry {
            Some(registry) => {
                registry.dispatch_with_user_info(identifier, NotificationEvent::Click, user_info);
            },
            None => {
                tracing::debug!(identifier = %identifier, "Click received before any notifier attached");
            },
        }
    }
}

/// Key of the caller payload inside the OS `userInfo` dictionary.
const USER_INFO_KEY: &str = "userInfo";

fn encode_user_info(payload: &str) -> Retained<NSDictionary> {
    let key = NSString::from_str(USER_INFO_KEY);
    let value = NSString::from_str(payload);
    let dictionary = NSDictionary::<NSString, NSString>::from_slices(&[&*key], &[&*value]);
    // SAFETY: the generic parameters only exist on the Rust side, the object
    // is a plain NSDictionary of strings.
    unsafe { Retained::cast_unchecked::<NSDictionary>(dictionary) }
}

fn decode_user_info(dictionary: &NSDictionary) -> Option<String> {
    let key = NSString::from_str(USER_INFO_KEY);
    // SAFETY: lookups only compare keys, which are all strings here.
    let value = unsafe { dictionary.objectForKey(&key) }?;
    value.downcast_ref::<NSString>().map(|payload| payload.to_string())
}

/// Process-wide delegate. The notification center only keeps a weak
/// reference, so the instance is held here for the life of the process.
static DELEGATE: OnceLock<Retained<NotificationDelegate>> = OnceLock::new();

fn shared_delegate() -> &'static NotificationDelegate {
    DELEGATE.get_or_init(|| {
        let delegate = NotificationDelegate::new();
        let center = UNUserNotificationCenter::currentNotificationCenter();
        // SAFETY: the delegate is retained by DELEGATE for the process lifetime.
        unsafe { center.setDelegate(Some(ProtocolObject::from_ref(&*delegate))) };
        tracing::debug!("Installed notification center delegate");
        delegate
    })
}

// =============================================================================
// Notification Center
// =============================================================================

/// `UNUserNotificationCenter` behind the [`NotificationCenter`] seam.
#[derive(Debug)]
pub struct MacNotificationCenter {
    _private: (),
}

impl MacNotificationCenter {
    /// Makes sure the process has a bundle identifier (required by
    /// UserNotifications) and installs the shared delegate.
    pub fn load(config: &NotifierConfig) -> Result<Self, BundleError> {
        let bundle_id = macos_bundle::ensure_bundle_identifier(&config.bundle_identifier)?;
        tracing::info!(bundle_id = %bundle_id, "Using macOS UserNotifications backend");
        shared_delegate();
        Ok(Self { _private: () })
    }

    fn center() -> Retained<UNUserNotificationCenter> {
        UNUserNotificationCenter::currentNotificationCenter()
    }

    fn identifiers(identifier: &str) -> Retained<NSArray<NSString>> {
        let identifier = NSString::from_str(identifier);
        NSArray::from_slice(&[&*identifier])
    }

    /// Create image attachment from a local file path. Failures are logged
    /// and the notification is sent without the image.
    fn create_image_attachment(
        file_path: &Path,
        identifier: &str,
    ) -> Option<Retained<UNNotificationAttachment>> {
        let path_str = file_path.to_string_lossy();
        let ns_url = NSURL::fileURLWithPath(&NSString::from_str(&path_str));
        let ns_identifier = NSString::from_str("contentImage");

        match unsafe {
            UNNotificationAttachment::attachmentWithIdentifier_URL_options_error(
                &ns_identifier,
                &ns_url,
                None,
            )
        } {
            Ok(attachment) => Some(attachment),
            Err(e) => {
                tracing::warn!(
                    identifier = %identifier,
                    path = %file_path.display(),
                    error = %e.localizedDescription(),
                    "Failed to create notification attachment, showing notification without image"
                );
                None
            },
        }
    }

    fn build_request(content: &NotificationContent) -> Retained<UNNotificationRequest> {
        let ns_content = UNMutableNotificationContent::new();
        ns_content.setTitle(&NSString::from_str(&content.title));

        if let Some(subtitle) = &content.subtitle {
            ns_content.setSubtitle(&NSString::from_str(subtitle));
        }
        if let Some(body) = &content.body {
            ns_content.setBody(&NSString::from_str(body));
        }
        if content.sound {
            let default_sound = UNNotificationSound::defaultSound();
            ns_content.setSound(Some(&default_sound));
        }
        if let Some(payload) = &content.user_info {
            // SAFETY: the dictionary holds only NSString keys and values.
            unsafe { ns_content.setUserInfo(&encode_user_info(payload)) };
        }
        if let Some(path) = &content.image {
            if let Some(attachment) = Self::create_image_attachment(path, &content.identifier) {
                let attachments = NSArray::from_slice(&[&*attachment]);
                ns_content.setAttachments(&attachments);
            }
        }

        // No trigger: deliver immediately.
        let identifier = NSString::from_str(&content.identifier);
        UNNotificationRequest::requestWithIdentifier_content_trigger(&identifier, &ns_content, None)
    }
}

impl NotificationCenter for MacNotificationCenter {
    fn request_authorization(&self, completion: Completion<bool>) {
        let options = UNAuthorizationOptions::Alert
            | UNAuthorizationOptions::Sound
            | UNAuthorizationOptions::Badge;

        let block = RcBlock::new(move |granted: Bool, error: *mut NSError| {
            // SAFETY: Apple passes either null or a valid NSError.
            if let Some(error) = unsafe { error.as_ref() } {
                tracing::warn!(error = %error.localizedDescription(), "Authorization request failed");
            }
            completion.fulfill(granted.as_bool());
        });

        // SAFETY: the block only captures a Send + Sync completion handle.
        unsafe {
            Self::center().requestAuthorizationWithOptions_completionHandler(options, &block)
        };
    }

    fn authorization_state(&self, completion: Completion<AuthorizationState>) {
        let block = RcBlock::new(move |settings: NonNull<UNNotificationSettings>| {
            // SAFETY: Apple guarantees a valid settings object in the handler.
            let settings = unsafe { settings.as_ref() };
            let status = settings.authorizationStatus();
            completion.fulfill(AuthorizationState::from_raw(status.0 as i64));
        });

        Self::center().getNotificationSettingsWithCompletionHandler(&block);
    }

    fn add_request(&self, content: NotificationContent, completion: Completion<Result<(), String>>) {
        let request = Self::build_request(&content);

        let block = RcBlock::new(move |error: *mut NSError| {
            // Success is indicated by a null error pointer.
            // SAFETY: Apple passes either null or a valid NSError.
            let outcome = match unsafe { error.as_ref() } {
                None => Ok(()),
                Some(error) => Err(error.localizedDescription().to_string()),
            };
            completion.fulfill(outcome);
        });

        Self::center().addNotificationRequest_withCompletionHandler(&request, Some(&block));
    }

    fn remove(&self, identifier: &str) {
        let center = Self::center();
        let identifiers = Self::identifiers(identifier);

        // Both queues, so a request still waiting for delivery never shows up.
        center.removePendingNotificationRequestsWithIdentifiers(&identifiers);
        center.removeDeliveredNotificationsWithIdentifiers(&identifiers);
    }

    fn remove_all(&self) {
        let center = Self::center();
        center.removeAllPendingNotificationRequests();
        center.removeAllDeliveredNotifications();
    }

    fn attach_registry(&self, registry: Arc<CallbackRegistry>) {
        shared_delegate().attach(registry);
    }
}
