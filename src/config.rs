//! Configuration types for feed-rattler

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Transport configuration shared by every cursor built on the same [`FeedClient`]
///
/// All fields have defaults, so an empty JSON/TOML document deserializes into
/// a working configuration.
///
/// [`FeedClient`]: crate::client::FeedClient
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Scheme and host every feed request is sent to (default: "https://twitter.com")
    ///
    /// Only the scheme, host and port are used; request paths are fixed per feed
    /// type. Pointing this somewhere else is mostly useful for tests.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout (default: 30 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept-Language header sent with every request (default: "en-US,en;q=0.9")
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Suffix appended to gallery image URLs to request a size variant (default: ":orig")
    #[serde(default = "default_media_variant")]
    pub media_variant: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            media_variant: default_media_variant(),
        }
    }
}

impl Config {
    /// Configuration targeting a different host, keeping every other default
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Check that the configuration can be used to build a client
    ///
    /// # Errors
    /// Returns [`Error::Config`] naming the offending key when:
    /// - `base_url` is not an absolute http(s) URL
    /// - `timeout` is zero
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL '{}': {}", self.base_url, e),
            key: Some("base_url".to_string()),
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::Config {
                message: format!("unsupported URL scheme '{}'", base.scheme()),
                key: Some("base_url".to_string()),
            });
        }

        if self.timeout.is_zero() {
            return Err(Error::Config {
                message: "timeout must be greater than zero".to_string(),
                key: Some("timeout".to_string()),
            });
        }

        if self.user_agent.trim().is_empty() {
            return Err(Error::Config {
                message: "user agent must not be empty".to_string(),
                key: Some("user_agent".to_string()),
            });
        }

        Ok(())
    }
}

fn default_base_url() -> String {
    "https://twitter.com".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:67.0) Gecko/20100101 Firefox/67.0".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

fn default_media_variant() -> String {
    ":orig".to_string()
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
