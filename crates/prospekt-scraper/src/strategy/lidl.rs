use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;

use prospekt_core::{Site, WeekKey};

use super::{first_week_key, SiteStrategy};
use crate::probe::{self, Interstitial};
use crate::session::Session;

/// Cloudinary-style size and quality segments in Lidl image URLs.
static SIZE_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([wh])_(?:400|600|800)\b").expect("valid regex"));

const UPGRADED_SIZE: &str = "2000";

const INTERSTITIALS: &[Interstitial] = &[
    Interstitial {
        name: "cookie banner",
        present: "#onetrust-banner-sdk",
        accept: "#onetrust-accept-btn-handler",
    },
    Interstitial {
        name: "store selection",
        present: "button[aria-label='Übersicht schließen']",
        accept: "button[aria-label='Übersicht schließen']",
    },
];

const TARGET_PROBES: &[&str] = &[
    "a.flyer[data-track-name='Aktionsprospekt']",
    "a.flyer[data-track-type='flyer']",
    "a[href*='aktionsprospekt']",
    ".flyer",
];

const IMAGE_PROBES: &[&str] = &[
    "div.page__wrapper img",
    ".page img",
    ".prospekt-page img",
    "img[src*='prospekt']",
    "img[data-src*='prospekt']",
    "img",
];

const NEXT_PROBES: &[&str] = &[
    "div.content_navigation.content_navigation--right button",
    ".content_navigation--right button",
    "button[aria-label*='next']",
    "button[aria-label*='weiter']",
];

const DOCUMENT_PROBES: &[&str] = &["a[href$='.pdf']", "a[download][href*='pdf']"];

/// lidl.de: paged flyer viewer with optional PDF download link.
///
/// Week keys come from the `DD-MM-YYYY-DD-MM-YYYY` slug of the viewer URL.
/// Lidl slugs end on Saturday, so a six-day range is extended to Sunday.
#[derive(Debug, Clone, Copy, Default)]
pub struct LidlStrategy;

#[async_trait]
impl SiteStrategy for LidlStrategy {
    fn site(&self) -> Site {
        Site::Lidl
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

    fn document_probes(&self) -> &'static [&'static str] {
        DOCUMENT_PROBES
    }

    fn upgrade_image_url(&self, url: String) -> String {
        upgrade_resolution(&url)
    }

    async fn resolve_week_key(
        &self,
        session: &mut dyn Session,
        target_url: &str,
        today: NaiveDate,
    ) -> WeekKey {
        let canonical = probe::query_or_empty(session, "link[rel='canonical']")
            .await
            .into_iter()
            .find_map(|link| link.attr("href").map(str::to_owned));
        let current = session.current_url().await.ok();

        let sources = [canonical.as_deref(), current.as_deref(), Some(target_url)];
        match first_week_key(sources.into_iter().flatten(), WeekKey::find_dashed_range) {
            Some(week) => week.extended_to_sunday(),
            None => {
                tracing::warn!(site = "lidl", "no week range in viewer URL; using calendar week");
                WeekKey::calendar_default(today)
            }
        }
    }
}

/// Request the 2000 px rendition at full quality.
fn upgrade_resolution(url: &str) -> String {
    let mut upgraded = url.to_owned();
    if url.contains("w_") && url.contains("h_") {
        upgraded = SIZE_SEGMENT_RE
            .replace_all(&upgraded, format!("${{1}}_{UPGRADED_SIZE}"))
            .into_owned();
    }
    upgraded.replace("q_auto", "q_100")
}
