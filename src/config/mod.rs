// ABOUTME: Health check configuration resolution and validation.
// ABOUTME: Merges explicit values, HEALTHCHECK_* env vars and defaults per field.

mod endpoint;
mod env_value;

pub use endpoint::{derive_sub_url, join_host_uuid};
pub use env_value::{env_bool, env_string, parse_bool};

use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const ENV_URL: &str = "HEALTHCHECK_URL";
pub const ENV_SEND_START: &str = "HEALTHCHECK_SEND_START";
pub const ENV_SEND_DIAGNOSTICS: &str = "HEALTHCHECK_SEND_DIAGNOSTICS";

/// Schemes a ping URL may use.
pub const VALID_URL_SCHEMES: [&str; 2] = ["http", "https"];

/// Connect/read timeout applied to every ping.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle event reported to the monitoring endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Sent before the job runs, when `send_start` is enabled.
    Start,
    /// Sent after the job returned normally.
    Success,
    /// Sent after the job returned an error or panicked.
    Fail,
}

impl Signal {
    /// Path segment appended to the base URL, if any.
    pub fn segment(self) -> Option<&'static str> {
        match self {
            Signal::Start => Some("start"),
            Signal::Success => None,
            Signal::Fail => Some("fail"),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Start => write!(f, "start"),
            Signal::Success => write!(f, "success"),
            Signal::Fail => write!(f, "fail"),
        }
    }
}

/// Why a configuration cannot be used to send pings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidConfig {
    #[error("missing URL")]
    MissingUrl,

    #[error("invalid URL {url}: {reason}")]
    Unparseable { url: String, reason: String },

    #[error("invalid URL scheme for URL: {url}")]
    UnsupportedScheme { url: String },

    #[error("invalid host for URL: {url}")]
    MissingHost { url: String },
}

/// Resolved health check settings. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthcheckConfig {
    pub url: Option<String>,
    pub send_start: bool,
    pub send_diagnostics: bool,
    pub timeout: Duration,
}

impl Default for HealthcheckConfig {
    fn default() -> Self {
        Self {
            url: None,
            send_start: false,
            send_diagnostics: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HealthcheckConfig {
    /// Resolve each field independently: explicit value, then the matching
    /// `HEALTHCHECK_*` environment variable, then the default.
    ///
    /// Never fails. An unusable result is reported by [`is_valid`](Self::is_valid).
    pub fn resolve(
        url: Option<String>,
        send_start: Option<bool>,
        send_diagnostics: Option<bool>,
    ) -> Self {
        Self {
            url: url.or_else(|| env_string(ENV_URL)),
            send_start: send_start
                .or_else(|| env_bool(ENV_SEND_START))
                .unwrap_or(false),
            send_diagnostics: send_diagnostics
                .or_else(|| env_bool(ENV_SEND_DIAGNOSTICS))
                .unwrap_or(false),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Resolve every field from the environment and defaults.
    pub fn from_env() -> Self {
        Self::resolve(None, None, None)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Parse and check the base URL.
    pub fn validate(&self) -> Result<Url, InvalidConfig> {
        let raw = match self.url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => return Err(InvalidConfig::MissingUrl),
        };

        let parsed = Url::parse(raw).map_err(|e| InvalidConfig::Unparseable {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        if !VALID_URL_SCHEMES.contains(&parsed.scheme()) {
            return Err(InvalidConfig::UnsupportedScheme {
                url: raw.to_string(),
            });
        }

        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(InvalidConfig::MissingHost {
                url: raw.to_string(),
            });
        }

        Ok(parsed)
    }

    /// Whether pings can be sent. Logs the reason when they can't.
    pub fn is_valid(&self) -> bool {
        match self.validate() {
            Ok(_) => true,
            Err(reason) => {
                tracing::warn!("{}", reason);
                false
            }
        }
    }

    /// URL the given lifecycle signal is sent to, or `None` when invalid.
    pub fn signal_url(&self, signal: Signal) -> Option<Url> {
        let base = self.validate().ok()?;
        Some(match signal.segment() {
            Some(segment) => derive_sub_url(&base, segment),
            None => base,
        })
    }

    pub fn start_url(&self) -> Option<Url> {
        self.signal_url(Signal::Start)
    }

    pub fn fail_url(&self) -> Option<Url> {
        self.signal_url(Signal::Fail)
    }
}
