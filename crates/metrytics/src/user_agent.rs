//! User-agent classification.

/// Browser label used when nothing matches.
pub const UNKNOWN_BROWSER: &str = "Unknown";

/// OS label used when nothing matches.
pub const UNKNOWN_OS: &str = "Unknown OS";

/// Browser and OS labels derived from a user-agent string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentInfo {
    pub browser: String,
    pub os: String,
}

/// Maps a raw user-agent string to browser and OS labels.
pub trait UserAgentClassifier: Send + Sync {
    fn classify(&self, user_agent: &str) -> UserAgentInfo;
}

/// Ordered substring lookup. First match wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringClassifier;

const BROWSERS: &[(&[&str], &str)] = &[
    // Chrome UAs also carry "Safari", so Chrome is checked first.
    (&["Chrome"], "Chrome"),
    (&["Firefox"], "Firefox"),
    (&["Safari"], "Safari"),
    (&["MSIE", "Trident"], "Internet Explorer"),
];

const OPERATING_SYSTEMS: &[(&[&str], &str)] = &[
    (&["Win"], "Windows"),
    (&["Mac"], "MacOS"),
    (&["X11", "Linux"], "Linux"),
];

fn lookup(table: &[(&[&str], &'static str)], user_agent: &str, fallback: &'static str) -> &'static str {
    table
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| user_agent.contains(n)))
        .map(|(_, label)| *label)
        .unwrap_or(fallback)
}

/// Browser label for a user-agent string.
pub fn browser_label(user_agent: &str) -> &'static str {
    lookup(BROWSERS, user_agent, UNKNOWN_BROWSER)
}

/// OS label for a user-agent string.
pub fn os_label(user_agent: &str) -> &'static str {
    lookup(OPERATING_SYSTEMS, user_agent, UNKNOWN_OS)
}

impl UserAgentClassifier for SubstringClassifier {
    fn classify(&self, user_agent: &str) -> UserAgentInfo {
        UserAgentInfo {
            browser: browser_label(user_agent).into(),
            os: os_label(user_agent).into(),
        }
    }
}
