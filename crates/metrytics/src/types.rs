//! Record types and serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Response body returned by the collector.
pub type CollectorResponse = Value;

/// Serializes timestamps the way the collector's JavaScript clients do:
/// millisecond precision with a `Z` suffix.
pub(crate) mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(ts: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => s.serialize_none(),
        }
    }
}

/// Per-call header overrides. Never part of a request body.
///
/// Names are stored lower-cased, so `X-Api-Key` and `x-api-key` are the same
/// entry and the later insert wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "HashMap<String, String>")]
pub struct ExtraHeaders(HashMap<String, String>);

impl ExtraHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any previous value for the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into().to_ascii_lowercase(), value.into());
    }

    /// Merge `other` on top of `self`; `other` wins on collisions.
    pub fn extend(&mut self, other: ExtraHeaders) {
        self.0.extend(other.0);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExtraHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Names differing only in case collapse to one entry; which one survives
/// is unspecified, as a `HashMap` has no order.
impl From<HashMap<String, String>> for ExtraHeaders {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

/// Page visit sent to `/visitor`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorRecord {
    pub app_name: String,
    pub page: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "iso_millis::serialize"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    /// Caller-supplied keys the SDK does not know about.
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// Named application event sent to `/events`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub app_name: String,
    pub event_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "iso_millis::serialize"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// Optional fields for a visitor tracking call.
///
/// Can be built in code or deserialized from loosely structured JSON;
/// `extraHeaders` is kept apart from everything else.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorExtras {
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub extra_headers: ExtraHeaders,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// Optional fields for an event tracking call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventExtras {
    #[serde(default)]
    pub event_description: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub extra_headers: ExtraHeaders,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}
