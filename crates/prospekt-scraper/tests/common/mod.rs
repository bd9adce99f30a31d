//! In-memory browser double shared by the integration tests.
//!
//! A `FakeSession` is a set of pages keyed by URL. Each page answers
//! selector queries from a fixed table, and clicking a selector can move
//! the session to another page.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use prospekt_core::AcquisitionConfig;
use prospekt_scraper::{BrowserError, DocumentRasterizer, DownloadManifest, ElementSnapshot, RasterError, Session};

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    elements: HashMap<String, Vec<ElementSnapshot>>,
    click_targets: HashMap<String, String>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, selector: &str, elements: Vec<ElementSnapshot>) -> Self {
        self.elements.insert(selector.to_owned(), elements);
        self
    }

    /// Clicking any match of `selector` moves the session to `url`.
    pub fn on_click(mut self, selector: &str, url: &str) -> Self {
        self.click_targets.insert(selector.to_owned(), url.to_owned());
        self
    }
}

#[derive(Debug, Default)]
pub struct FakeSession {
    pages: HashMap<String, FakePage>,
    current: String,
    pub navigations: Vec<String>,
    pub clicks: Vec<(String, usize)>,
    pub close_calls: usize,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_owned(), page);
        self
    }

    pub fn current(&self) -> &str {
        &self.current
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        if !self.pages.contains_key(url) {
            return Err(BrowserError::Script {
                selector: url.to_owned(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_owned(),
            });
        }
        self.navigations.push(url.to_owned());
        url.clone_into(&mut self.current);
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        Ok(self.current.clone())
    }

    async fn query(&mut self, selector: &str) -> Result<Vec<ElementSnapshot>, BrowserError> {
        Ok(self
            .pages
            .get(&self.current)
            .and_then(|page| page.elements.get(selector))
            .cloned()
            .unwrap_or_default())
    }

    async fn click(&mut self, selector: &str, index: usize) -> Result<(), BrowserError> {
        let page = self.pages.get(&self.current);
        let exists = page
            .and_then(|p| p.elements.get(selector))
            .is_some_and(|found| found.len() > index);
        if !exists {
            return Err(BrowserError::NoSuchElement {
                selector: selector.to_owned(),
                index,
            });
        }
        let target = page.and_then(|p| p.click_targets.get(selector)).cloned();
        self.clicks.push((selector.to_owned(), index));
        if let Some(url) = target {
            self.current = url;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.close_calls += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Element builders
// ---------------------------------------------------------------------------

fn element(tag: &str, attrs: &[(&str, &str)]) -> ElementSnapshot {
    ElementSnapshot {
        tag: tag.to_owned(),
        attributes: attrs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect(),
        visible: true,
        enabled: true,
        ..ElementSnapshot::default()
    }
}

pub fn image(src: &str) -> ElementSnapshot {
    let mut img = element("img", &[("src", src)]);
    img.natural_width = Some(1400);
    img.natural_height = Some(2000);
    img
}

pub fn thumbnail(src: &str) -> ElementSnapshot {
    element("img", &[("src", src), ("width", "80"), ("height", "80")])
}

pub fn link(href: &str, text: &str) -> ElementSnapshot {
    let mut a = element("a", &[("href", href)]);
    a.text = text.to_owned();
    a
}

pub fn button() -> ElementSnapshot {
    element("button", &[("class", "content_navigation__button")])
}

pub fn disabled_button() -> ElementSnapshot {
    element("button", &[("class", "content_navigation__button"), ("disabled", "")])
}

pub fn canonical(href: &str) -> ElementSnapshot {
    element("link", &[("rel", "canonical"), ("href", href)])
}

// ---------------------------------------------------------------------------
// Run fixtures
// ---------------------------------------------------------------------------

/// Config with every wait disabled and downloads rooted at `root`.
pub fn test_config(root: &Path) -> AcquisitionConfig {
    AcquisitionConfig {
        download_root: root.to_path_buf(),
        page_timeout: Duration::ZERO,
        settle_delay: Duration::ZERO,
        request_timeout: Duration::from_secs(5),
        ..AcquisitionConfig::default()
    }
}

/// Rasterizer double: records the document it saw and writes `pages`
/// placeholder JPEGs, or fails when `pages` is zero.
#[derive(Debug, Clone)]
pub struct FakeRasterizer {
    pages: usize,
    pub seen_documents: Arc<Mutex<Vec<PathBuf>>>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeRasterizer {
    pub fn producing(pages: usize) -> Self {
        Self {
            pages,
            seen_documents: Arc::default(),
            calls: Arc::default(),
        }
    }

    pub fn last_document(&self) -> Option<PathBuf> {
        self.seen_documents.lock().unwrap().last().cloned()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentRasterizer for FakeRasterizer {
    async fn rasterize(&self, document: &Path, out_dir: &Path) -> Result<DownloadManifest, RasterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_documents.lock().unwrap().push(document.to_path_buf());
        assert!(document.exists(), "document must exist while rasterizing");

        if self.pages == 0 {
            return Err(RasterError::NoPages {
                path: document.display().to_string(),
            });
        }
        let mut manifest = DownloadManifest::new();
        for _ in 0..self.pages {
            std::fs::write(out_dir.join(manifest.next_file_name()), b"\xFF\xD8jpeg")?;
            manifest.commit_next();
        }
        Ok(manifest)
    }
}
