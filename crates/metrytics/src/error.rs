//! Error types for the Metrytics SDK.

use std::fmt;

/// Tracking clients exposed by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    Visitors,
    Events,
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientKind::Visitors => f.write_str("Visitors"),
            ClientKind::Events => f.write_str("Events"),
        }
    }
}

/// Errors that can occur when using the Metrytics SDK.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid collector configuration passed to `initialize`.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A required tracking argument (app name, page, event name) is empty.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A tracking client was requested before the registry was initialized.
    #[error("{0} client not initialized. Call Metrytics::initialize() first.")]
    Uninitialized(ClientKind),

    /// The collector answered with a non-2xx status.
    #[error("HTTP error! status: {status}, message: {body}")]
    Transport { status: u16, body: String },

    /// The collector could not be reached.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The HTTP client could not be constructed; nothing was sent.
    #[error("HTTP client setup failed: {0}")]
    HttpClient(reqwest::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A caller-supplied header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl Error {
    /// HTTP status carried by a transport failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}
