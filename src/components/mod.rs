// Notification data model shared by the capable backend and the stub facade
// Field names serialize in the host application's camelCase shape

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod completion;
pub mod config;
pub mod platform;
pub mod registry;

pub use completion::Completion;
pub use config::NotifierConfig;
pub use platform::{
    AuthorizationState, BoxFuture, NativeNotifier, NotificationCenter, NotificationContent,
};
pub use registry::{CallbackRegistry, ClickCallback, RegistrationToken};

/// Options for a single notification, as handed over by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Absolute path of an image to attach as `contentImage`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_image: Option<PathBuf>,
    /// Correlation key for the later click event. Generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Opaque payload echoed back to the click callback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<String>,
    #[serde(default = "default_sound")]
    pub sound: bool,
}

fn default_sound() -> bool {
    true
}

impl NotificationRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sound: true,
            ..Default::default()
        }
    }

    /// Parse the host's JSON options object. Shape violations surface as
    /// [`NotifyError::InvalidArgument`].
    pub fn from_json(json: &str) -> NotifyResult<Self> {
        serde_json::from_str(json).map_err(|e| NotifyError::InvalidArgument {
            field: "options".to_string(),
            message: e.to_string(),
        })
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_content_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.content_image = Some(path.into());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_user_info(mut self, user_info: impl Into<String>) -> Self {
        self.user_info = Some(user_info.into());
        self
    }

    pub fn with_sound(mut self, sound: bool) -> Self {
        self.sound = sound;
        self
    }

    /// Checks required fields. Runs before any asynchronous work.
    pub fn validate(&self) -> NotifyResult<()> {
        if self.title.is_empty() {
            return Err(NotifyError::InvalidArgument {
                field: "title".to_string(),
                message: "title is required".to_string(),
            });
        }
        if matches!(self.identifier.as_deref(), Some("")) {
            return Err(NotifyError::InvalidArgument {
                field: "identifier".to_string(),
                message: "identifier must not be empty when provided".to_string(),
            });
        }
        Ok(())
    }

    /// The caller's identifier, or a fresh process-unique token.
    pub fn resolve_identifier(&self) -> String {
        self.identifier
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }
}

/// Outcome of `show_notification`, delivered exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl NotificationResult {
    pub fn delivered(identifier: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            identifier: Some(identifier.into()),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            identifier: None,
        }
    }
}

/// Three-valued permission status exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    NotDetermined,
}

impl PermissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionStatus::Granted => "granted",
            PermissionStatus::Denied => "denied",
            PermissionStatus::NotDetermined => "notDetermined",
        }
    }
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event kinds delivered to click callbacks.
///
/// `Dismiss` is part of the callback contract but the delegate never
/// produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationEvent {
    Click,
    Dismiss,
}

/// Error types for the notification bridge
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Missing or malformed caller input
    #[error("Invalid argument `{field}`: {message}")]
    InvalidArgument { field: String, message: String },
    /// The OS backend could not be brought up
    #[error("Platform error: {message}")]
    Platform { message: String },
    /// The process has no usable bundle identifier (macOS)
    #[error("Bundle setup failed: {message}")]
    Bundle { message: String },
}

#[cfg(target_os = "macos")]
impl From<crate::backends::macos_bundle::BundleError> for NotifyError {
    fn from(error: crate::backends::macos_bundle::BundleError) -> Self {
        NotifyError::Bundle {
            message: error.to_string(),
        }
    }
}

pub type NotifyResult<T> = Result<T, NotifyError>;
