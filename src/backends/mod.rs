// Notifier backends: the UserNotifications bridge on macOS, the inert stub
// everywhere else

pub mod native;
pub mod stub;

#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(target_os = "macos")]
pub mod macos_bundle;

pub use native::{BridgeError, Notifier};
pub use stub::{StubNotifier, UNAVAILABLE_MESSAGE};

#[cfg(target_os = "macos")]
pub use macos::MacNotificationCenter;

#[cfg(not(target_os = "macos"))]
use crate::components::NotifyError;
use crate::components::{NativeNotifier, NotifierConfig, NotifyResult};

/// Selects the notifier implementation for the current platform
pub struct PlatformBackendFactory;

impl PlatformBackendFactory {
    /// Whether this target has a capable backend at all.
    pub fn platform_supported() -> bool {
        cfg!(target_os = "macos")
    }

    /// Creates the capable backend, or reports why this process cannot have
    /// one.
    pub fn try_create_backend(config: NotifierConfig) -> NotifyResult<Box<dyn NativeNotifier>> {
        #[cfg(target_os = "macos")]
        {
            let center = macos::MacNotificationCenter::load(&config)?;
            Ok(Box::new(Notifier::with_config(center, config)))
        }

        #[cfg(not(target_os = "macos"))]
        {
            let _ = config;
            Err(NotifyError::Platform {
                message: UNAVAILABLE_MESSAGE.to_string(),
            })
        }
    }

    /// Like [`Self::try_create_backend`], but substitutes the stub on
    /// failure so callers always get a usable notifier.
    pub fn create_backend(config: NotifierConfig) -> Box<dyn NativeNotifier> {
        match Self::try_create_backend(config) {
            Ok(backend) => backend,
            Err(error) => {
                if Self::platform_supported() {
                    tracing::warn!(%error, "Notification backend failed to load, using stub");
                } else {
                    tracing::info!("Native notifications are not supported on this platform, using stub");
                }
                Box::new(StubNotifier::new())
            },
        }
    }
}
