use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bundle identifier registered for unbundled processes (cargo run/test).
pub const DEFAULT_BUNDLE_IDENTIFIER: &str = "dev.native-notify";

/// Runtime options for the notifier backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotifierConfig {
    /// Upper bound on waiting for an OS completion handler. `None` waits
    /// until the OS answers.
    #[serde(with = "optional_millis")]
    pub completion_timeout: Option<Duration>,
    /// Bundle identifier set at runtime when the process has none.
    pub bundle_identifier: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            completion_timeout: None,
            bundle_identifier: DEFAULT_BUNDLE_IDENTIFIER.to_string(),
        }
    }
}

impl NotifierConfig {
    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = Some(timeout);
        self
    }

    pub fn with_bundle_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.bundle_identifier = identifier.into();
        self
    }
}

/// Serde helper for `Option<Duration>` as whole milliseconds.
mod optional_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(duration) => {
                let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                serializer.serialize_some(&millis)
            },
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
