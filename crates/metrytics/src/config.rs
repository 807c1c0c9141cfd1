//! Collector configuration.

use std::time::Duration;

/// Path prefix every tracking endpoint lives under.
pub const API_PREFIX: &str = "/api/analytics";

/// Collector configuration shared by every tracking client.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub(crate) base_url: String,
    pub(crate) api_key: String,
    pub(crate) timeout: Option<Duration>,
}

impl CollectorConfig {
    /// Create a new builder with the given collector URL and API key.
    pub fn builder(base_url: impl Into<String>, api_key: impl Into<String>) -> CollectorConfigBuilder {
        CollectorConfigBuilder::new(base_url, api_key)
    }

    /// Get the collector base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the request timeout, if one was set.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Full URL for an endpoint path such as `/events`.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }
}

/// Builder for [`CollectorConfig`].
#[derive(Debug)]
pub struct CollectorConfigBuilder {
    base_url: String,
    api_key: String,
    timeout: Option<Duration>,
}

impl CollectorConfigBuilder {
    /// Create a new builder with the given collector URL and API key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: None,
        }
    }

    /// Set a request timeout. Requests have no timeout unless one is set.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<CollectorConfig, crate::Error> {
        let base_url = self.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(crate::Error::Config("base_url cannot be empty".into()));
        }
        if self.api_key.trim().is_empty() {
            return Err(crate::Error::Config("api_key cannot be empty".into()));
        }

        Ok(CollectorConfig {
            base_url: base_url.to_string(),
            api_key: self.api_key,
            timeout: self.timeout,
        })
    }
}
