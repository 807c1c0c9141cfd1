//! Client registry: initialization and access to the tracking clients.

use crate::client::{EventClient, VisitorClient};
use crate::config::CollectorConfig;
use crate::error::ClientKind;
use crate::transport::Dispatcher;
use crate::user_agent::{SubstringClassifier, UserAgentClassifier};
use crate::Error;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

struct Clients {
    config: CollectorConfig,
    visitors: VisitorClient,
    events: EventClient,
}

/// Composition root for the tracking clients.
///
/// Starts uninitialized. The first successful [`initialize`](Self::initialize)
/// builds the shared configuration and both clients; later calls are no-ops
/// and there is no way back to the uninitialized state.
///
/// # Example
///
/// ```rust,no_run
/// use metrytics::Metrytics;
///
/// #[tokio::main]
/// async fn main() -> Result<(), metrytics::Error> {
///     let metrytics = Metrytics::new();
///     metrytics.initialize("https://collector.example.com", "key_xxx")?;
///
///     metrytics
///         .events()?
///         .track_event("storefront", "checkout")
///         .description("cart with 3 items")
///         .send()
///         .await?;
///     Ok(())
/// }
/// ```
pub struct Metrytics {
    clients: OnceLock<Clients>,
    classifier: Arc<dyn UserAgentClassifier>,
}

impl Metrytics {
    /// Create an uninitialized registry.
    pub fn new() -> Self {
        Self::with_classifier(Arc::new(SubstringClassifier))
    }

    /// Create an uninitialized registry whose visitor client uses `classifier`.
    pub fn with_classifier(classifier: Arc<dyn UserAgentClassifier>) -> Self {
        Self {
            clients: OnceLock::new(),
            classifier,
        }
    }

    /// Validate arguments and initialize on first call.
    pub fn initialize(
        &self,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<&Self, Error> {
        let config = CollectorConfig::builder(base_url, api_key).build()?;
        self.initialize_with(config)
    }

    /// Initialize from a prebuilt configuration.
    pub fn initialize_with(&self, config: CollectorConfig) -> Result<&Self, Error> {
        if self.clients.get().is_some() {
            debug!("already initialized, keeping existing configuration");
            return Ok(self);
        }

        let base_url = config.base_url().to_string();
        let dispatcher = Arc::new(Dispatcher::new(config.clone())?);
        let clients = Clients {
            config,
            visitors: VisitorClient::new(dispatcher.clone(), self.classifier.clone()),
            events: EventClient::new(dispatcher),
        };

        // A concurrent caller may have won; theirs stays.
        if self.clients.set(clients).is_ok() {
            info!(base_url = %base_url, "metrytics initialized");
        }

        Ok(self)
    }

    /// Whether [`initialize`](Self::initialize) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.clients.get().is_some()
    }

    /// Get the active configuration.
    pub fn config(&self) -> Option<&CollectorConfig> {
        self.clients.get().map(|c| &c.config)
    }

    /// Visitor tracking client.
    pub fn visitors(&self) -> Result<&VisitorClient, Error> {
        self.clients
            .get()
            .map(|c| &c.visitors)
            .ok_or(Error::Uninitialized(ClientKind::Visitors))
    }

    /// Event tracking client.
    pub fn events(&self) -> Result<&EventClient, Error> {
        self.clients
            .get()
            .map(|c| &c.events)
            .ok_or(Error::Uninitialized(ClientKind::Events))
    }
}

impl Default for Metrytics {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Metrytics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrytics")
            .field("config", &self.config())
            .finish_non_exhaustive()
    }
}
