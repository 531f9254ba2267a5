//! Search engine implementations.

pub mod brave;
pub mod duckduckgo;

use serde::{Deserialize, Serialize};
use url::Url;

/// Available search engines.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SearchEngine {
    /// DuckDuckGo HTML search (no API key required).
    #[default]
    DuckDuckGo,
    /// Brave Search API (API key required).
    Brave,
}

impl SearchEngine {
    /// Get the display name of the search engine.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DuckDuckGo => "DuckDuckGo",
            Self::Brave => "Brave Search",
        }
    }

    /// Check if this engine requires an API key.
    #[must_use]
    pub const fn requires_api_key(&self) -> bool {
        matches!(self, Self::Brave)
    }

    /// Parse an engine name as given in the environment.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "duckduckgo" | "ddg" => Some(Self::DuckDuckGo),
            "brave" => Some(Self::Brave),
            _ => None,
        }
    }
}

/// Extract the host from a URL, without a leading `www.`.
pub(crate) fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url).ok().and_then(|u| {
        u.host_str()
            .map(|host| host.strip_prefix("www.").unwrap_or(host).to_string())
    })
}
