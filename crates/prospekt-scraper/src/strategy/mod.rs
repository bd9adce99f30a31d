//! Per-retailer acquisition strategies and the factory that selects them.
//!
//! A strategy is mostly data: ordered probe lists, most specific first, that
//! the default trait methods evaluate through [`crate::probe`]. Retailers
//! override only what differs, such as week-key parsing or URL rewriting.

mod angebote;
mod lidl;
mod netto;

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use prospekt_core::{Site, WeekKey};

pub use angebote::AngeboteStrategy;
pub use lidl::LidlStrategy;
pub use netto::NettoStrategy;

use crate::error::StrategyError;
use crate::probe::{self, Interstitial};
use crate::session::{ElementSnapshot, Session};
use crate::types::{ScrapeTarget, TargetKind};

/// Images declared smaller than this in either dimension are icons, logos,
/// or thumbnails, not flyer pages.
pub const MIN_PAGE_IMAGE_PX: u32 = 200;

/// Attributes that may carry an image URL, highest resolution first.
const IMAGE_URL_ATTRIBUTES: [&str; 4] = ["data-src", "data-original", "data-large", "src"];

const DEFAULT_TARGET_LABEL: &str = "Prospekt";

/// Retailer-specific knowledge driven by the acquisition orchestrator.
#[async_trait]
pub trait SiteStrategy: Send + Sync {
    fn site(&self) -> Site;

    /// Delivery kind of the targets this strategy discovers.
    fn target_kind(&self) -> TargetKind {
        TargetKind::PagedViewer
    }

    fn interstitials(&self) -> &'static [Interstitial] {
        &[]
    }

    /// Link probes for [`Self::discover_targets`].
    fn target_probes(&self) -> &'static [&'static str];

    /// Image probes for [`Self::extract_page_images`]. The first entry also
    /// serves as the viewer's readiness selector.
    fn image_probes(&self) -> &'static [&'static str] {
        &[]
    }

    /// "Next page" control probes for [`Self::advance_to_next_page`].
    fn next_probes(&self) -> &'static [&'static str] {
        &[]
    }

    /// Link probes for [`Self::locate_document_url`].
    fn document_probes(&self) -> &'static [&'static str] {
        &[]
    }

    /// Selector that matches once a viewer page has rendered.
    fn page_ready_selector(&self) -> &'static str {
        self.image_probes().first().copied().unwrap_or("img")
    }

    /// Close cookie banners and overlays. Each interstitial gets its own
    /// bounded wait; absence is not an error.
    async fn dismiss_interstitials(&self, session: &mut dyn Session, wait: Duration) {
        for interstitial in self.interstitials() {
            probe::dismiss(session, *interstitial, wait).await;
        }
    }

    /// Candidate flyers from the first target probe that matches, in page
    /// order and deduplicated by URL.
    async fn discover_targets(&self, session: &mut dyn Session) -> Vec<ScrapeTarget> {
        let Some((selector, found)) = probe::first_non_empty(session, self.target_probes()).await
        else {
            return Vec::new();
        };
        let targets = targets_from_links(&found, self.target_kind(), self.site().origin());
        tracing::debug!(
            site = %self.site(),
            selector,
            count = targets.len(),
            "discovered targets"
        );
        targets
    }

    /// Page-sized images from the first image probe that matches.
    async fn extract_page_images(&self, session: &mut dyn Session) -> Vec<ElementSnapshot> {
        probe::first_non_empty(session, self.image_probes())
            .await
            .map(|(_, found)| found.into_iter().filter(is_page_sized).collect())
            .unwrap_or_default()
    }

    /// Best download URL for a page image, after site-specific upgrades.
    fn image_url(&self, image: &ElementSnapshot) -> Option<String> {
        resolve_image_url(image, self.site().origin()).map(|url| self.upgrade_image_url(url))
    }

    /// Rewrite an image URL to request a higher-resolution rendition.
    fn upgrade_image_url(&self, url: String) -> String {
        url
    }

    /// Click the first usable "next" control. `false` means there is no
    /// further page, or no probe found a control.
    async fn advance_to_next_page(&self, session: &mut dyn Session) -> bool {
        let Some((selector, index)) = probe::first_interactable(session, self.next_probes()).await
        else {
            return false;
        };
        match session.click(selector, index).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(site = %self.site(), selector, error = %e, "next control click failed");
                false
            }
        }
    }

    /// URL of a downloadable document for the current page, if any.
    async fn locate_document_url(&self, session: &mut dyn Session) -> Option<String> {
        let (_, found) = probe::first_non_empty(session, self.document_probes()).await?;
        found
            .iter()
            .find_map(|link| link.attr("href"))
            .map(|href| absolutize(href, self.site().origin()))
    }

    /// Validity window of the selected flyer. Never fails: anything that
    /// cannot be parsed yields [`WeekKey::calendar_default`].
    async fn resolve_week_key(
        &self,
        session: &mut dyn Session,
        target_url: &str,
        today: NaiveDate,
    ) -> WeekKey;
}

/// Strategy for the site whose domain occurs in `url`.
///
/// # Errors
///
/// Returns [`StrategyError::NoStrategyAvailable`] for unsupported domains.
pub fn strategy_for_url(url: &str) -> Result<Box<dyn SiteStrategy>, StrategyError> {
    Site::for_url(url)
        .map(strategy_for_site)
        .ok_or_else(|| StrategyError::NoStrategyAvailable {
            url: url.to_owned(),
        })
}

/// Canonical start URL and strategy for a site key such as `"lidl"`.
///
/// # Errors
///
/// Returns [`StrategyError::Config`] wrapping
/// [`prospekt_core::ConfigError::UnknownSite`] for unknown keys.
pub fn strategy_for_key(key: &str) -> Result<(&'static str, Box<dyn SiteStrategy>), StrategyError> {
    let site = Site::from_key(key)?;
    Ok((site.start_url(), strategy_for_site(site)))
}

#[must_use]
pub fn strategy_for_site(site: Site) -> Box<dyn SiteStrategy> {
    match site {
        Site::Lidl => Box::new(LidlStrategy),
        Site::Angebote => Box::new(AngeboteStrategy),
        Site::Netto => Box::new(NettoStrategy),
    }
}

/// Make a protocol- or host-relative URL absolute against `origin`.
#[must_use]
pub fn absolutize(url: &str, origin: &str) -> String {
    if let Some(rest) = url.strip_prefix("//") {
        format!("https://{rest}")
    } else if url.starts_with('/') {
        format!("{}{url}", origin.trim_end_matches('/'))
    } else {
        url.to_owned()
    }
}

/// First usable URL among the image URL attributes, skipping inline
/// `data:` URIs.
#[must_use]
pub fn resolve_image_url(image: &ElementSnapshot, origin: &str) -> Option<String> {
    IMAGE_URL_ATTRIBUTES
        .iter()
        .filter_map(|name| image.attr(name))
        .map(str::trim)
        .find(|url| !url.is_empty() && !url.starts_with("data:"))
        .map(|url| absolutize(url, origin))
}

/// `false` only when the image declares a size below
/// [`MIN_PAGE_IMAGE_PX`]; images of unknown size are kept.
#[must_use]
pub fn is_page_sized(image: &ElementSnapshot) -> bool {
    image
        .declared_size()
        .is_none_or(|(w, h)| w >= MIN_PAGE_IMAGE_PX && h >= MIN_PAGE_IMAGE_PX)
}

fn targets_from_links(links: &[ElementSnapshot], kind: TargetKind, origin: &str) -> Vec<ScrapeTarget> {
    let mut seen = HashSet::new();
    links
        .iter()
        .filter_map(|link| {
            let url = absolutize(link.attr("href")?, origin);
            if !seen.insert(url.clone()) {
                return None;
            }
            let label = link
                .attr("data-track-name")
                .or_else(|| Some(link.text.trim()).filter(|t| !t.is_empty()))
                .unwrap_or(DEFAULT_TARGET_LABEL);
            Some(ScrapeTarget::new(label, url, kind))
        })
        .collect()
}

/// First candidate in `sources` that yields a week key.
fn first_week_key<'a>(
    sources: impl IntoIterator<Item = &'a str>,
    parse: impl Fn(&str) -> Option<WeekKey>,
) -> Option<WeekKey> {
    sources.into_iter().find_map(parse)
}

#[cfg(test)]
#[path = "strategy_test.rs"]
mod tests;
