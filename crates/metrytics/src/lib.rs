//! Metrytics visitor and event tracking SDK for Rust.
//!
//! Every tracking call sends exactly one POST to the collector and returns
//! its outcome. Nothing is queued, batched or retried: failures are logged
//! through `tracing` and handed back to the caller.
//!
//! # Example
//!
//! ```rust,no_run
//! use metrytics::Metrytics;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), metrytics::Error> {
//!     let metrytics = Metrytics::new();
//!     metrytics.initialize("https://collector.example.com", "key_xxx")?;
//!
//!     metrytics
//!         .visitors()?
//!         .track_visitor("storefront", "/home")
//!         .user_agent("Mozilla/5.0 (X11; Linux x86_64) Firefox/121.0")
//!         .header("X-Request-Id", "abc123")
//!         .send()
//!         .await?;
//!
//!     metrytics
//!         .events()?
//!         .track_event("storefront", "signup")
//!         .property("plan", "pro")
//!         .send()
//!         .await?;
//!     Ok(())
//! }
//! ```

mod builders;
mod client;
mod config;
mod error;
mod registry;
mod transport;
pub mod types;
pub mod user_agent;

use std::sync::OnceLock;

pub use client::{EventClient, SendableEvent, SendableVisit, VisitorClient};
pub use config::{CollectorConfig, CollectorConfigBuilder, API_PREFIX};
pub use error::{ClientKind, Error};
pub use registry::Metrytics;
pub use transport::{Dispatcher, Endpoint, API_KEY_HEADER};
pub use types::{
    CollectorResponse, EventExtras, EventRecord, ExtraHeaders, VisitorExtras, VisitorRecord,
};
pub use user_agent::{SubstringClassifier, UserAgentClassifier, UserAgentInfo};

static GLOBAL: OnceLock<Metrytics> = OnceLock::new();

/// Process-wide registry, for hosts that do not thread one through.
pub fn global() -> &'static Metrytics {
    GLOBAL.get_or_init(Metrytics::new)
}

/// Initialize the process-wide registry.
pub fn initialize(
    base_url: impl Into<String>,
    api_key: impl Into<String>,
) -> Result<&'static Metrytics, Error> {
    global().initialize(base_url, api_key)
}
