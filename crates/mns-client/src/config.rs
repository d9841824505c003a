//! Client and queue configuration.
//!
//! Settings can be built in code with the `with_*` methods or loaded from an
//! optional file layered under `MNS__*` environment variables:
//!
//! ```text
//! MNS__CLIENT__ENDPOINT=https://123456.mns.cn-hangzhou.aliyuncs.com
//! MNS__CLIENT__ACCESS_KEY_ID=...
//! MNS__QUEUE__QPS_LIMIT=100
//! ```

use crate::error::ConfigurationError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Protocol version sent with every request
pub const API_VERSION: &str = "2015-06-06";

/// Request timeout applied when none is configured, long enough for a 30s long poll
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 35;

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 3;

/// Messages requested by batch receive/peek when the caller passes zero
pub const DEFAULT_NUM_OF_MESSAGES: u32 = 16;

pub const DEFAULT_QPS_LIMIT: u64 = 2000;

pub const DEFAULT_QPS_WINDOW_SECS: u64 = 5;

const ENV_PREFIX: &str = "MNS";

// ============================================================================
// Client configuration
// ============================================================================

/// Connection settings for one service endpoint
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the account endpoint, without a trailing slash
    pub endpoint: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_key_id: String::new(),
            access_key_secret: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given endpoint and access key pair.
    pub fn new(
        endpoint: impl Into<String>,
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            ..Self::default()
        }
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the access key pair.
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
    ) -> Self {
        self.access_key_id = access_key_id.into();
        self.access_key_secret = access_key_secret.into();
        self
    }

    /// Set the request timeout. Zero falls back to the default.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    /// Set the connect timeout. Zero falls back to the default.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_secs = timeout.as_secs();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(non_zero_or(
            self.request_timeout_secs,
            DEFAULT_REQUEST_TIMEOUT_SECS,
        ))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(non_zero_or(
            self.connect_timeout_secs,
            DEFAULT_CONNECT_TIMEOUT_SECS,
        ))
    }

    /// Check that the settings can produce a working client
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigurationError::Missing {
                key: "client.endpoint".to_string(),
            });
        }

        let url = url::Url::parse(self.endpoint.trim()).map_err(|e| ConfigurationError::Invalid {
            message: format!("endpoint '{}' is not a valid URL: {}", self.endpoint, e),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigurationError::Invalid {
                message: format!("endpoint scheme must be http or https, got '{}'", url.scheme()),
            });
        }

        if self.access_key_id.is_empty() {
            return Err(ConfigurationError::Missing {
                key: "client.access_key_id".to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<REDACTED>")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

// ============================================================================
// Queue options
// ============================================================================

/// Per-queue behaviour of a [`QueueClient`](crate::queue::QueueClient)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueueOptions {
    /// Average requests per second the client tries to stay under
    pub qps_limit: u64,
    /// Seconds of history used to compute the observed rate (minimum 5)
    pub qps_window_secs: u64,
    /// Batch size used when a batch receive/peek asks for zero messages
    pub default_num_of_messages: u32,
    /// Look up `MNS_PROXY_<QUEUE>` / `MNS_GLOBAL_PROXY` at construction
    pub proxy_from_env: bool,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            qps_limit: DEFAULT_QPS_LIMIT,
            qps_window_secs: DEFAULT_QPS_WINDOW_SECS,
            default_num_of_messages: DEFAULT_NUM_OF_MESSAGES,
            proxy_from_env: true,
        }
    }
}

impl QueueOptions {
    /// Set the QPS ceiling. Zero keeps the default.
    pub fn with_qps_limit(mut self, qps_limit: u64) -> Self {
        self.qps_limit = non_zero_or(qps_limit, DEFAULT_QPS_LIMIT);
        self
    }

    pub fn with_qps_window_secs(mut self, window_secs: u64) -> Self {
        self.qps_window_secs = window_secs;
        self
    }

    pub fn with_default_num_of_messages(mut self, count: u32) -> Self {
        self.default_num_of_messages = count;
        self
    }

    pub fn with_proxy_from_env(mut self, enabled: bool) -> Self {
        self.proxy_from_env = enabled;
        self
    }
}

// ============================================================================
// Layered loading
// ============================================================================

/// Everything needed to talk to one queue
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MnsSettings {
    pub client: ClientConfig,
    pub queue: QueueOptions,
}

impl MnsSettings {
    /// Load settings from an optional file overridden by `MNS__*` variables.
    ///
    /// The file format is inferred from its extension. A file that is given
    /// but missing is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigurationError::Parsing {
                message: e.to_string(),
            })?;

        settings.client.validate()?;
        Ok(settings)
    }
}

pub(crate) fn non_zero_or(value: u64, default: u64) -> u64 {
    if value == 0 {
        default
    } else {
        value
    }
}
