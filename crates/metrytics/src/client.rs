//! Visitor and event tracking clients.

use crate::builders::{EventBuilder, VisitorBuilder};
use crate::transport::{Dispatcher, Endpoint};
use crate::types::{CollectorResponse, EventExtras, VisitorExtras};
use crate::user_agent::UserAgentClassifier;
use crate::Error;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

// ============================================
// VISITORS
// ============================================

/// Reports page visits to the collector's `/visitor` endpoint.
///
/// # Example
///
/// ```rust,no_run
/// # use metrytics::Metrytics;
/// # async fn example(metrytics: &Metrytics) -> Result<(), metrytics::Error> {
/// metrytics
///     .visitors()?
///     .track_visitor("storefront", "/pricing")
///     .ip_address("203.0.113.7")
///     .referrer("https://news.ycombinator.com")
///     .send()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct VisitorClient {
    dispatcher: Arc<Dispatcher>,
    classifier: Arc<dyn UserAgentClassifier>,
}

impl VisitorClient {
    pub(crate) fn new(dispatcher: Arc<Dispatcher>, classifier: Arc<dyn UserAgentClassifier>) -> Self {
        Self {
            dispatcher,
            classifier,
        }
    }

    /// Track a page visit.
    pub fn track_visitor(
        &self,
        app_name: impl Into<String>,
        page: impl Into<String>,
    ) -> SendableVisit<'_> {
        SendableVisit {
            builder: VisitorBuilder::new(app_name, page),
            client: self,
        }
    }

    /// Track a page visit from a loosely structured extras value.
    pub async fn track_visitor_with(
        &self,
        app_name: impl Into<String>,
        page: impl Into<String>,
        extras: VisitorExtras,
    ) -> Result<CollectorResponse, Error> {
        self.track_visitor(app_name, page).extras(extras).send().await
    }

    #[instrument(skip_all)]
    async fn send(&self, builder: VisitorBuilder) -> Result<CollectorResponse, Error> {
        let out = builder.build(self.classifier.as_ref())?;
        self.dispatcher
            .send(Endpoint::Visitor, &out.record, &out.headers)
            .await
    }
}

impl fmt::Debug for VisitorClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisitorClient")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Sendable visitor record builder.
pub struct SendableVisit<'a> {
    builder: VisitorBuilder,
    client: &'a VisitorClient,
}

impl<'a> SendableVisit<'a> {
    /// Merge an extras value.
    pub fn extras(mut self, extras: VisitorExtras) -> Self {
        self.builder = self.builder.extras(extras);
        self
    }

    pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
        self.builder = self.builder.ip_address(ip);
        self
    }

    pub fn browser(mut self, browser: impl Into<String>) -> Self {
        self.builder = self.builder.browser(browser);
        self
    }

    pub fn os(mut self, os: impl Into<String>) -> Self {
        self.builder = self.builder.os(os);
        self
    }

    pub fn referrer(mut self, referrer: impl Into<String>) -> Self {
        self.builder = self.builder.referrer(referrer);
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.builder = self.builder.city(city);
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.builder = self.builder.country(country);
        self
    }

    /// Derive browser and os from a raw user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.builder = self.builder.user_agent(user_agent);
        self
    }

    pub fn timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.builder = self.builder.timestamp(ts);
        self
    }

    /// Add a header for this request only.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Add a property.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.builder = self.builder.property(key, value);
        self
    }

    /// Send the visit.
    pub async fn send(self) -> Result<CollectorResponse, Error> {
        self.client.send(self.builder).await
    }
}

// ============================================
// EVENTS
// ============================================

/// Reports named application events to the collector's `/events` endpoint.
#[derive(Debug)]
pub struct EventClient {
    dispatcher: Arc<Dispatcher>,
}

impl EventClient {
    pub(crate) fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Track a named event.
    pub fn track_event(
        &self,
        app_name: impl Into<String>,
        event_name: impl Into<String>,
    ) -> SendableEvent<'_> {
        SendableEvent {
            builder: EventBuilder::new(app_name, event_name),
            client: self,
        }
    }

    /// Track a named event from a loosely structured extras value.
    pub async fn track_event_with(
        &self,
        app_name: impl Into<String>,
        event_name: impl Into<String>,
        extras: EventExtras,
    ) -> Result<CollectorResponse, Error> {
        self.track_event(app_name, event_name).extras(extras).send().await
    }

    #[instrument(skip_all)]
    async fn send(&self, builder: EventBuilder) -> Result<CollectorResponse, Error> {
        let out = builder.build()?;
        self.dispatcher
            .send(Endpoint::Events, &out.record, &out.headers)
            .await
    }
}

/// Sendable event record builder.
pub struct SendableEvent<'a> {
    builder: EventBuilder,
    client: &'a EventClient,
}

impl<'a> SendableEvent<'a> {
    /// Merge an extras value.
    pub fn extras(mut self, extras: EventExtras) -> Self {
        self.builder = self.builder.extras(extras);
        self
    }

    /// Set the event description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.builder = self.builder.description(description);
        self
    }

    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.builder = self.builder.ip(ip);
        self
    }

    pub fn timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.builder = self.builder.timestamp(ts);
        self
    }

    /// Add a header for this request only.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Add a property.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.builder = self.builder.property(key, value);
        self
    }

    /// Send the event.
    pub async fn send(self) -> Result<CollectorResponse, Error> {
        self.client.send(self.builder).await
    }
}
