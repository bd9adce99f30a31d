use async_trait::async_trait;
use chrono::NaiveDate;

use prospekt_core::{Site, WeekKey};

use super::{absolutize, first_week_key, SiteStrategy};
use crate::probe::{self, Interstitial};
use crate::session::{ElementSnapshot, Session};
use crate::types::TargetKind;

const INTERSTITIALS: &[Interstitial] = &[Interstitial {
    name: "cookie banner",
    present: "#usercentrics-root, #uc-center-container",
    accept: "button[data-testid='uc-accept-all-button']",
}];

const TARGET_PROBES: &[&str] = &[
    "a[href$='.pdf'][href*='rospekt']",
    "a[href$='.pdf']",
    "a[href*='.pdf']",
];

const PDF_LINK_SELECTOR: &str = "a[href*='.pdf']";

/// Places where Netto prints the validity window of a PDF.
const WEEK_TEXT_PROBES: &[&str] = &[PDF_LINK_SELECTOR, "a[href*='.pdf'] img", "img[alt*='.']"];

/// netto-online.de: flyers are published as PDF downloads.
///
/// The validity window is printed as `DD.MM. - DD.MM.YYYY` in the link
/// text, the preview image's alt text, or the PDF file name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NettoStrategy;

#[async_trait]
impl SiteStrategy for NettoStrategy {
    fn site(&self) -> Site {
        Site::Netto
    }

    fn target_kind(&self) -> TargetKind {
        TargetKind::Document
    }

    fn interstitials(&self) -> &'static [Interstitial] {
        INTERSTITIALS
    }

    fn target_probes(&self) -> &'static [&'static str] {
        TARGET_PROBES
    }

    fn document_probes(&self) -> &'static [&'static str] {
        TARGET_PROBES
    }

    async fn resolve_week_key(
        &self,
        session: &mut dyn Session,
        target_url: &str,
        today: NaiveDate,
    ) -> WeekKey {
        let own = target_link_texts(session, target_url).await;
        let mut page: Vec<String> = Vec::new();
        for selector in WEEK_TEXT_PROBES {
            for element in probe::query_or_empty(session, selector).await {
                push_texts(&mut page, element);
            }
        }

        // The selected PDF's own link wins over other dated PDFs on the page.
        let sources = own
            .iter()
            .map(String::as_str)
            .chain([target_url])
            .chain(page.iter().map(String::as_str));
        first_week_key(sources, |text| {
            WeekKey::find_dotted_range(text, today).or_else(|| WeekKey::find_dashed_range(text))
        })
        .unwrap_or_else(|| {
            tracing::warn!(site = "netto", "no validity window found; using calendar week");
            WeekKey::calendar_default(today)
        })
    }
}

/// Title, alt text and link text of the link that points at `target_url`,
/// followed by those of the preview image inside it.
async fn target_link_texts(session: &mut dyn Session, target_url: &str) -> Vec<String> {
    let origin = Site::Netto.origin();
    let mut texts = Vec::new();
    for link in probe::query_or_empty(session, PDF_LINK_SELECTOR).await {
        if link.attr("href").is_some_and(|href| absolutize(href, origin) == target_url) {
            push_texts(&mut texts, link);
        }
    }
    if let Some(selector) = preview_image_selector(target_url) {
        for image in probe::query_or_empty(session, &selector).await {
            push_texts(&mut texts, image);
        }
    }
    texts
}

/// Selector for images inside links to the same PDF file name, which
/// matches relative and absolute hrefs alike.
fn preview_image_selector(target_url: &str) -> Option<String> {
    let path = target_url.split(['?', '#']).next()?;
    let file = path.rsplit('/').next().filter(|f| !f.is_empty())?;
    let escaped = file.replace('\\', "\\\\").replace('"', "\\\"");
    Some(format!("a[href*=\"{escaped}\"] img"))
}

fn push_texts(texts: &mut Vec<String>, element: ElementSnapshot) {
    texts.extend(element.attr("title").map(str::to_owned));
    texts.extend(element.attr("alt").map(str::to_owned));
    if !element.text.is_empty() {
        texts.push(element.text);
    }
}
