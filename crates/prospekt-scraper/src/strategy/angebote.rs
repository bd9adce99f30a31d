use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;

use prospekt_core::{Site, WeekKey};

use super::{first_week_key, SiteStrategy};
use crate::probe::{self, Interstitial};
use crate::session::Session;

/// `…/lidl/woche-26-ab-23-06-2025-bis-28-06-2025-seite-1-…`
static WEEK_SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ab-(\d{2}-\d{2}-\d{4})-bis-(\d{2}-\d{2}-\d{4})").expect("valid regex")
});

const WEEK_LINK_SELECTOR: &str = "a[href*='/lidl/woche-']";

const INTERSTITIALS: &[Interstitial] = &[Interstitial {
    name: "cookie banner",
    present: "[data-testid='cookie-accept'], .cookie-accept, #accept-cookies",
    accept: "[data-testid='cookie-accept'], .cookie-accept, #accept-cookies",
}];

const TARGET_PROBES: &[&str] = &[
    "a[href*='prospekt']",
    WEEK_LINK_SELECTOR,
    "a[href*='flyer']",
    ".prospekt-link",
    ".flyer-link",
];

const IMAGE_PROBES: &[&str] = &[
    ".prospekt-page img",
    ".flyer-page img",
    "img[src*='prospekt']",
    "img[data-src*='prospekt']",
    "img",
];

const NEXT_PROBES: &[&str] = &["a[href*='seite']"];

/// angebote.com flyer archive: one viewer page per URL, paged via
/// `…-seite-N-…` links.
///
/// The `ab-…-bis-…` window in the week links is used exactly as published.
#[derive(Debug, Clone, Copy, Default)]
pub struct AngeboteStrategy;

#[async_trait]
impl SiteStrategy for AngeboteStrategy {
    fn site(&self) -> Site {
        Site::Angebote
    }

    fn interstitials(&self) -> &'static [Interstitial] {
        INTERSTITIALS
    }

    fn target_probes(&self) -> &'static [&'static str] {
        TARGET_PROBES
    }

    fn image_probes(&self) -> &'static [&'static str] {
        IMAGE_PROBES
    }

    fn next_probes(&self) -> &'static [&'static str] {
        NEXT_PROBES
    }

    async fn resolve_week_key(
        &self,
        session: &mut dyn Session,
        target_url: &str,
        today: NaiveDate,
    ) -> WeekKey {
        let hrefs: Vec<String> = probe::query_or_empty(session, WEEK_LINK_SELECTOR)
            .await
            .into_iter()
            .filter_map(|link| link.attr("href").map(str::to_owned))
            .collect();

        // The target's own slug names the week being downloaded.
        let sources = [target_url].into_iter().chain(hrefs.iter().map(String::as_str));
        first_week_key(sources, parse_week_slug).unwrap_or_else(|| {
            tracing::warn!(site = "angebote", "no week slug in links; using calendar week");
            WeekKey::calendar_default(today)
        })
    }
}

fn parse_week_slug(href: &str) -> Option<WeekKey> {
    WEEK_SLUG_RE
        .find(href)
        .and_then(|m| WeekKey::find_dashed_range(m.as_str()))
}
