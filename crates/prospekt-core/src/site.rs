//! Registry of supported retailers.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A retailer whose weekly flyer can be acquired.
///
/// Variant order is the dispatch priority used when matching URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Lidl,
    Angebote,
    Netto,
}

impl Site {
    /// Every supported site in dispatch priority order.
    pub const ALL: [Site; 3] = [Site::Lidl, Site::Angebote, Site::Netto];

    /// Stable key used on the command line and as the output sub-directory.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Site::Lidl => "lidl",
            Site::Angebote => "angebote",
            Site::Netto => "netto",
        }
    }

    /// Canonical page listing the current flyers.
    #[must_use]
    pub fn start_url(self) -> &'static str {
        match self {
            Site::Lidl => "https://www.lidl.de/c/online-prospekte/s10005610",
            Site::Angebote => "https://angebote.com/lidl/archives?page=1",
            Site::Netto => "https://www.netto-online.de/ueber-netto/Online-Prospekte.chtm",
        }
    }

    /// Substring that identifies the retailer's URLs.
    #[must_use]
    pub fn domain_fragment(self) -> &'static str {
        match self {
            Site::Lidl => "lidl.de",
            Site::Angebote => "angebote.com",
            Site::Netto => "netto-online.de",
        }
    }

    /// Origin used to absolutise host-relative URLs found in markup.
    #[must_use]
    pub fn origin(self) -> &'static str {
        match self {
            Site::Lidl => "https://www.lidl.de",
            Site::Angebote => "https://angebote.com",
            Site::Netto => "https://www.netto-online.de",
        }
    }

    /// Resolve a site from its command-line key (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSite`] for unrecognised keys.
    pub fn from_key(key: &str) -> Result<Self, ConfigError> {
        let wanted = key.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|site| site.key() == wanted)
            .ok_or_else(|| ConfigError::UnknownSite(key.to_string()))
    }

    /// First site (in priority order) whose domain fragment occurs in `url`.
    #[must_use]
    pub fn for_url(url: &str) -> Option<Self> {
        let lowered = url.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|site| lowered.contains(site.domain_fragment()))
    }
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
