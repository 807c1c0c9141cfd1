//! Record builders for the fluent tracking API.
//!
//! Each builder turns required arguments plus caller extras into two
//! separate values: the record that becomes the request body and the
//! header overlay for that one request.

use crate::types::{EventExtras, EventRecord, ExtraHeaders, VisitorExtras, VisitorRecord};
use crate::user_agent::UserAgentClassifier;
use crate::Error;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

/// A record ready for dispatch together with its header overlay.
#[derive(Debug)]
pub(crate) struct Outgoing<R> {
    pub record: R,
    pub headers: ExtraHeaders,
}

/// Wire name of the header overlay inside loose extras.
const EXTRA_HEADERS_KEY: &str = "extraHeaders";

fn require(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Drop unknown keys that would shadow a required field on the wire.
fn strip_reserved(mut additional: Map<String, Value>, reserved: &[&str]) -> Map<String, Value> {
    for key in reserved {
        if additional.remove(*key).is_some() {
            debug!(key, "ignoring extra that shadows a required field");
        }
    }
    additional
}

/// Move an `extraHeaders` object out of the unknown keys into an overlay.
fn take_headers(additional: &mut Map<String, Value>) -> ExtraHeaders {
    let mut headers = ExtraHeaders::new();
    match additional.remove(EXTRA_HEADERS_KEY) {
        Some(Value::Object(map)) => {
            for (name, value) in map {
                match value {
                    Value::String(value) => headers.insert(name, value),
                    _ => debug!(header = %name, "ignoring non-string extra header"),
                }
            }
        }
        Some(_) => debug!("ignoring extraHeaders that is not an object"),
        None => {}
    }
    headers
}

/// Move an unknown key naming a modelled string field into that field.
/// The typed value wins when both are set.
fn take_string(additional: &mut Map<String, Value>, key: &str, slot: &mut Option<String>) {
    if let Some(value) = additional.remove(key) {
        match value {
            Value::String(s) if slot.is_none() => *slot = Some(s),
            _ => debug!(key, "ignoring extra that shadows a modelled field"),
        }
    }
}

fn take_timestamp(additional: &mut Map<String, Value>, slot: &mut Option<DateTime<Utc>>) {
    if let Some(value) = additional.remove("timestamp") {
        match serde_json::from_value::<DateTime<Utc>>(value) {
            Ok(ts) if slot.is_none() => *slot = Some(ts),
            _ => debug!("ignoring extra that shadows the timestamp field"),
        }
    }
}

/// Keep `current` unless it is unset.
fn fill<T>(current: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *current = incoming;
    }
}

// ============================================
// VISITOR BUILDER
// ============================================

/// Builder for visitor records.
#[derive(Debug)]
pub struct VisitorBuilder {
    app_name: String,
    page: String,
    extras: VisitorExtras,
    user_agent: Option<String>,
}

impl VisitorBuilder {
    pub(crate) fn new(app_name: impl Into<String>, page: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            page: page.into(),
            extras: VisitorExtras::default(),
            user_agent: None,
        }
    }

    /// Merge a whole extras value; fields it sets replace earlier ones.
    pub fn extras(mut self, extras: VisitorExtras) -> Self {
        let current = &mut self.extras;
        fill(&mut current.ip_address, extras.ip_address);
        fill(&mut current.browser, extras.browser);
        fill(&mut current.os, extras.os);
        fill(&mut current.referrer, extras.referrer);
        fill(&mut current.city, extras.city);
        fill(&mut current.country, extras.country);
        fill(&mut current.timestamp, extras.timestamp);
        current.extra_headers.extend(extras.extra_headers);
        current.additional.extend(extras.additional);
        self
    }

    pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
        self.extras.ip_address = Some(ip.into());
        self
    }

    pub fn browser(mut self, browser: impl Into<String>) -> Self {
        self.extras.browser = Some(browser.into());
        self
    }

    pub fn os(mut self, os: impl Into<String>) -> Self {
        self.extras.os = Some(os.into());
        self
    }

    pub fn referrer(mut self, referrer: impl Into<String>) -> Self {
        self.extras.referrer = Some(referrer.into());
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.extras.city = Some(city.into());
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.extras.country = Some(country.into());
        self
    }

    /// Raw user agent; browser and os are derived from it unless set.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.extras.timestamp = Some(ts);
        self
    }

    /// Add a header for this request only.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.extra_headers.insert(name, value);
        self
    }

    /// Add a field the SDK does not model; sent verbatim.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.additional.insert(key.into(), value.into());
        self
    }

    /// Build the record.
    pub(crate) fn build(
        self,
        classifier: &dyn UserAgentClassifier,
    ) -> Result<Outgoing<VisitorRecord>, Error> {
        require("appName", &self.app_name)?;
        require("page", &self.page)?;

        let VisitorExtras {
            mut ip_address,
            mut browser,
            mut os,
            mut referrer,
            mut city,
            mut country,
            mut timestamp,
            extra_headers,
            mut additional,
        } = self.extras;

        let mut headers = take_headers(&mut additional);
        headers.extend(extra_headers);
        take_string(&mut additional, "ipAddress", &mut ip_address);
        take_string(&mut additional, "browser", &mut browser);
        take_string(&mut additional, "os", &mut os);
        take_string(&mut additional, "referrer", &mut referrer);
        take_string(&mut additional, "city", &mut city);
        take_string(&mut additional, "country", &mut country);
        take_timestamp(&mut additional, &mut timestamp);

        if let Some(ua) = self.user_agent.as_deref() {
            let info = classifier.classify(ua);
            browser.get_or_insert(info.browser);
            os.get_or_insert(info.os);
        }

        Ok(Outgoing {
            record: VisitorRecord {
                app_name: self.app_name,
                page: self.page,
                ip_address,
                browser,
                os,
                referrer,
                city,
                country,
                timestamp,
                additional: strip_reserved(additional, &["appName", "page"]),
            },
            headers,
        })
    }
}

// ============================================
// EVENT BUILDER
// ============================================

/// Builder for event records.
#[derive(Debug)]
pub struct EventBuilder {
    app_name: String,
    event_name: String,
    extras: EventExtras,
}

impl EventBuilder {
    pub(crate) fn new(app_name: impl Into<String>, event_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            event_name: event_name.into(),
            extras: EventExtras::default(),
        }
    }

    /// Merge a whole extras value; fields it sets replace earlier ones.
    pub fn extras(mut self, extras: EventExtras) -> Self {
        let current = &mut self.extras;
        fill(&mut current.event_description, extras.event_description);
        fill(&mut current.ip, extras.ip);
        fill(&mut current.timestamp, extras.timestamp);
        current.extra_headers.extend(extras.extra_headers);
        current.additional.extend(extras.additional);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.extras.event_description = Some(description.into());
        self
    }

    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.extras.ip = Some(ip.into());
        self
    }

    pub fn timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.extras.timestamp = Some(ts);
        self
    }

    /// Add a header for this request only.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.extra_headers.insert(name, value);
        self
    }

    /// Add a field the SDK does not model; sent verbatim.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.additional.insert(key.into(), value.into());
        self
    }

    /// Build the record.
    pub(crate) fn build(self) -> Result<Outgoing<EventRecord>, Error> {
        require("appName", &self.app_name)?;
        require("eventName", &self.event_name)?;

        let EventExtras {
            mut event_description,
            mut ip,
            mut timestamp,
            extra_headers,
            mut additional,
        } = self.extras;

        let mut headers = take_headers(&mut additional);
        headers.extend(extra_headers);
        take_string(&mut additional, "eventDescription", &mut event_description);
        take_string(&mut additional, "ip", &mut ip);
        take_timestamp(&mut additional, &mut timestamp);

        Ok(Outgoing {
            record: EventRecord {
                app_name: self.app_name,
                event_name: self.event_name,
                event_description,
                ip,
                timestamp,
                additional: strip_reserved(additional, &["appName", "eventName"]),
            },
            headers,
        })
    }
}
