//! HTTP dispatch of tracking records.

use crate::config::CollectorConfig;
use crate::types::{CollectorResponse, ExtraHeaders};
use crate::Error;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use tracing::{debug, error};

/// Header carrying the collector API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Collector endpoints, relative to `{base_url}/api/analytics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Visitor,
    Events,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Visitor => "/visitor",
            Endpoint::Events => "/events",
        }
    }
}

/// Sends one POST per call to the collector and classifies the outcome.
///
/// Shared by every tracking client; holds nothing mutable.
#[derive(Debug)]
pub struct Dispatcher {
    client: reqwest::Client,
    config: CollectorConfig,
}

impl Dispatcher {
    /// Create a new dispatcher.
    pub fn new(config: CollectorConfig) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(Error::HttpClient)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Default headers with `extra` merged on top.
    pub(crate) fn headers(&self, extra: &ExtraHeaders) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let api_key = HeaderValue::from_str(self.config.api_key())
            .map_err(|_| Error::InvalidHeader(API_KEY_HEADER.into()))?;
        headers.insert(API_KEY_HEADER, api_key);

        for (name, value) in extra.iter() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidHeader(name.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::InvalidHeader(name.to_string()))?;
            // Names are case-insensitive, so a caller's "content-type" replaces ours.
            headers.insert(name, value);
        }

        Ok(headers)
    }

    /// POST `payload` to `endpoint`.
    ///
    /// Every failure is logged once at error level and returned.
    pub async fn send<T: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        payload: &T,
        extra_headers: &ExtraHeaders,
    ) -> Result<CollectorResponse, Error> {
        let url = self.config.endpoint_url(endpoint.path());

        let result = self.try_send(&url, payload, extra_headers).await;
        if let Err(e) = &result {
            match e {
                Error::Transport { status, body } => {
                    error!(endpoint = %url, status, body = %body, "collector request failed")
                }
                other => error!(endpoint = %url, error = %other, "collector request failed"),
            }
        }
        result
    }

    async fn try_send<T: Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &T,
        extra_headers: &ExtraHeaders,
    ) -> Result<CollectorResponse, Error> {
        let headers = self.headers(extra_headers)?;
        let body = serde_json::to_vec(payload)?;

        debug!(endpoint = %url, bytes = body.len(), "sending record");

        let response = self
            .client
            .post(url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::Transport {
                status: status.as_u16(),
                body: text,
            });
        }

        debug!(status = %status, "record accepted");

        if text.trim().is_empty() {
            return Ok(CollectorResponse::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
