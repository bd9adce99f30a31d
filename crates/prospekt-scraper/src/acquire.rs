//! Acquisition orchestrator: drives one [`SiteStrategy`] over one
//! [`Session`] and produces a [`ScrapeResult`].
//!
//! ```text
//! Init → PopupHandling → Discovering → Selecting → WeekResolution
//!      → IdempotencyCheck → PagedCrawl | DocumentFetch → Done | Failed
//! ```
//!
//! Pages are written into a hidden staging directory next to the week
//! directory and only renamed into place once at least one page exists, so
//! a week directory is never observed half-written.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

use prospekt_core::{AcquisitionConfig, WeekKey};

use crate::error::{BrowserError, FetchError, RasterError};
use crate::fetch::ResourceFetcher;
use crate::manifest::DownloadManifest;
use crate::raster::DocumentRasterizer;
use crate::session::Session;
use crate::strategy::SiteStrategy;
use crate::types::{ScrapeResult, ScrapeTarget, TargetKind};

/// Consecutive pages yielding only already-saved images before the crawl
/// assumes the viewer is stuck.
pub const STALLED_PAGE_LIMIT: usize = 3;

/// Upper bound on the wait for any single interstitial.
const MAX_INTERSTITIAL_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    PopupHandling,
    Discovering,
    Selecting,
    WeekResolution,
    IdempotencyCheck,
    PagedCrawl,
    DocumentFetch,
    Done,
    Failed,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::PopupHandling => "popup_handling",
            Phase::Discovering => "discovering",
            Phase::Selecting => "selecting",
            Phase::WeekResolution => "week_resolution",
            Phase::IdempotencyCheck => "idempotency_check",
            Phase::PagedCrawl => "paged_crawl",
            Phase::DocumentFetch => "document_fetch",
            Phase::Done => "done",
            Phase::Failed => "failed",
        }
    }
}

/// Reasons a run ends in [`ScrapeResult::failed`]. The `Display` text is
/// what callers see in `ScrapeResult::error`.
#[derive(Debug, Error)]
enum AcquireError {
    #[error("Could not find any scrapable content")]
    NoScrapableTarget,

    #[error("No pages could be downloaded")]
    NoPages,

    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: BrowserError,
    },

    #[error("document download failed: {0}")]
    DocumentFetch(#[from] FetchError),

    #[error("document rasterization failed: {0}")]
    Raster(#[from] RasterError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl AcquireError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Failure that may already know which week it was acquiring.
struct RunFailure {
    error: AcquireError,
    week_key: Option<WeekKey>,
}

impl From<AcquireError> for RunFailure {
    fn from(error: AcquireError) -> Self {
        Self {
            error,
            week_key: None,
        }
    }
}

/// Everything one acquisition run needs besides the strategy and session.
pub struct Acquisition<'a> {
    config: &'a AcquisitionConfig,
    fetcher: &'a ResourceFetcher,
    rasterizer: &'a dyn DocumentRasterizer,
    today: NaiveDate,
}

impl<'a> Acquisition<'a> {
    #[must_use]
    pub fn new(
        config: &'a AcquisitionConfig,
        fetcher: &'a ResourceFetcher,
        rasterizer: &'a dyn DocumentRasterizer,
        today: NaiveDate,
    ) -> Self {
        Self {
            config,
            fetcher,
            rasterizer,
            today,
        }
    }

    /// Acquire the current flyer reachable from `start_url`.
    ///
    /// Never fails: every runtime problem is reported through
    /// [`ScrapeResult::error`]. The session is closed before returning,
    /// whatever the outcome.
    pub async fn run(
        &self,
        strategy: &dyn SiteStrategy,
        session: &mut dyn Session,
        start_url: &str,
    ) -> ScrapeResult {
        let site = strategy.site();
        let result = match self.acquire(strategy, session, start_url).await {
            Ok(result) => {
                log_phase(site.key(), Phase::Done);
                result
            }
            Err(failure) => {
                tracing::error!(
                    site = site.key(),
                    phase = Phase::Failed.as_str(),
                    error = %failure.error,
                    "acquisition failed"
                );
                ScrapeResult::failed(failure.error.to_string(), failure.week_key)
            }
        };

        if let Err(e) = session.close().await {
            tracing::warn!(site = site.key(), error = %e, "failed to close browser session");
        }
        result
    }

    async fn acquire(
        &self,
        strategy: &dyn SiteStrategy,
        session: &mut dyn Session,
        start_url: &str,
    ) -> Result<ScrapeResult, RunFailure> {
        let site = strategy.site().key();

        log_phase(site, Phase::Init);
        self.navigate(session, start_url).await?;

        log_phase(site, Phase::PopupHandling);
        strategy
            .dismiss_interstitials(session, self.interstitial_wait())
            .await;

        log_phase(site, Phase::Discovering);
        let targets = strategy.discover_targets(session).await;
        for (i, target) in targets.iter().enumerate() {
            tracing::info!(site, index = i + 1, label = %target.label, url = %target.url, "found flyer");
        }

        log_phase(site, Phase::Selecting);
        let Some(target) = targets.into_iter().next() else {
            return Err(AcquireError::NoScrapableTarget.into());
        };
        if target.kind == TargetKind::PagedViewer {
            let current = session.current_url().await.unwrap_or_default();
            if current != target.url {
                self.navigate(session, &target.url).await?;
            }
        }

        log_phase(site, Phase::WeekResolution);
        let week_key = strategy
            .resolve_week_key(session, &target.url, self.today)
            .await;
        tracing::info!(site, week_key = %week_key, "resolved week");
        let with_week = move |error: AcquireError| RunFailure {
            error,
            week_key: Some(week_key),
        };

        log_phase(site, Phase::IdempotencyCheck);
        let week_dir = week_directory(&self.config.download_root, site, &week_key);
        let existing = DownloadManifest::scan(&week_dir).await;
        if !existing.is_empty() {
            tracing::info!(
                site,
                pages = existing.len(),
                dir = %week_dir.display(),
                "week already acquired; skipping download"
            );
            return Ok(ScrapeResult::succeeded(existing, week_dir, week_key));
        }

        let staging = self
            .config
            .download_root
            .join(site)
            .join(format!(".{week_key}.partial"));
        prepare_staging(&staging).await.map_err(with_week)?;

        let acquired = self
            .acquire_into(strategy, session, &target, &staging)
            .await;
        let manifest = match acquired {
            Ok(manifest) if !manifest.is_empty() => manifest,
            Ok(_) => {
                discard_staging(&staging).await;
                return Err(with_week(AcquireError::NoPages));
            }
            Err(e) => {
                discard_staging(&staging).await;
                return Err(with_week(e));
            }
        };

        publish(&staging, &week_dir).await.map_err(with_week)?;
        tracing::info!(
            site,
            pages = manifest.len(),
            dir = %week_dir.display(),
            "flyer acquired"
        );
        Ok(ScrapeResult::succeeded(manifest, week_dir, week_key))
    }

    /// Pick the delivery path for `target` and fill `staging` with pages.
    async fn acquire_into(
        &self,
        strategy: &dyn SiteStrategy,
        session: &mut dyn Session,
        target: &ScrapeTarget,
        staging: &Path,
    ) -> Result<DownloadManifest, AcquireError> {
        let site = strategy.site().key();

        if target.kind == TargetKind::Document {
            return self.fetch_document(site, &target.url, staging).await;
        }

        if self.config.prefer_document_over_images {
            if let Some(url) = strategy.locate_document_url(session).await {
                tracing::info!(site, url = %url, "document preferred over viewer images");
                return self.fetch_document(site, &url, staging).await;
            }
        }

        let manifest = self.crawl_pages(strategy, session, staging).await;
        if !manifest.is_empty() {
            return Ok(manifest);
        }

        match strategy.locate_document_url(session).await {
            Some(url) => {
                tracing::warn!(site, url = %url, "viewer yielded no pages; falling back to document");
                self.fetch_document(site, &url, staging).await
            }
            None => Ok(manifest),
        }
    }

    /// Walk the viewer one page at a time, saving one new image per page.
    async fn crawl_pages(
        &self,
        strategy: &dyn SiteStrategy,
        session: &mut dyn Session,
        staging: &Path,
    ) -> DownloadManifest {
        let site = strategy.site().key();
        log_phase(site, Phase::PagedCrawl);

        let mut manifest = DownloadManifest::new();
        let mut saved_urls: HashSet<String> = HashSet::new();
        let mut stalled_pages = 0;

        for page in 1..=self.config.max_pages {
            if let Err(e) = session
                .wait_for(strategy.page_ready_selector(), self.config.page_timeout)
                .await
            {
                tracing::debug!(site, page, error = %e, "page readiness probe failed");
            }

            let mut page_urls: HashSet<String> = HashSet::new();
            let mut already_saved = 0usize;
            let mut saved = false;
            for image in strategy.extract_page_images(session).await {
                let Some(url) = strategy.image_url(&image) else {
                    continue;
                };
                if saved_urls.contains(&url) {
                    already_saved += 1;
                    continue;
                }
                if !page_urls.insert(url.clone()) {
                    continue;
                }
                let dest = staging.join(manifest.next_file_name());
                if self.fetcher.download(&url, &dest).await {
                    let file = manifest.commit_next();
                    tracing::info!(site, page, file, "saved page");
                    saved_urls.insert(url);
                    saved = true;
                    break;
                }
            }

            if saved {
                stalled_pages = 0;
            } else if page_urls.is_empty() && already_saved > 0 {
                stalled_pages += 1;
                tracing::warn!(site, page, "only already-saved images on page");
            } else if page_urls.is_empty() {
                tracing::warn!(site, page, "no images found on page");
            } else {
                tracing::warn!(site, page, "every image on page failed to download");
            }
            if stalled_pages >= STALLED_PAGE_LIMIT {
                tracing::warn!(site, page, "viewer appears stuck; stopping crawl");
                break;
            }

            if page == self.config.max_pages {
                tracing::info!(site, max_pages = page, "page limit reached");
                break;
            }
            if !strategy.advance_to_next_page(session).await {
                tracing::info!(site, page, "no further pages");
                break;
            }
            self.settle().await;
        }

        manifest
    }

    /// Download a document to a temporary file in `staging` and rasterize it.
    /// The temporary file is deleted on every path.
    async fn fetch_document(
        &self,
        site: &str,
        url: &str,
        staging: &Path,
    ) -> Result<DownloadManifest, AcquireError> {
        log_phase(site, Phase::DocumentFetch);

        let document = tempfile::Builder::new()
            .prefix(".document-")
            .suffix(".pdf")
            .tempfile_in(staging)
            .map_err(|e| AcquireError::io(staging, e))?;

        let bytes = self.fetcher.try_download(url, document.path()).await?;
        tracing::info!(site, url, bytes, "downloaded document");

        let manifest = self.rasterizer.rasterize(document.path(), staging).await?;
        tracing::info!(site, pages = manifest.len(), "rasterized document");
        Ok(manifest)
    }

    async fn navigate(&self, session: &mut dyn Session, url: &str) -> Result<(), AcquireError> {
        session
            .navigate(url)
            .await
            .map_err(|source| AcquireError::Navigation {
                url: url.to_owned(),
                source,
            })?;
        self.settle().await;
        Ok(())
    }

    async fn settle(&self) {
        if !self.config.settle_delay.is_zero() {
            tokio::time::sleep(self.config.settle_delay).await;
        }
    }

    fn interstitial_wait(&self) -> Duration {
        self.config.page_timeout.min(MAX_INTERSTITIAL_WAIT)
    }
}

fn log_phase(site: &str, phase: Phase) {
    tracing::info!(site, phase = phase.as_str(), "phase");
}

/// Start from an empty staging directory, discarding leftovers of a crashed run.
async fn prepare_staging(staging: &Path) -> Result<(), AcquireError> {
    if tokio::fs::try_exists(staging).await.unwrap_or(false) {
        tracing::warn!(dir = %staging.display(), "removing stale staging directory");
        tokio::fs::remove_dir_all(staging)
            .await
            .map_err(|e| AcquireError::io(staging, e))?;
    }
    tokio::fs::create_dir_all(staging)
        .await
        .map_err(|e| AcquireError::io(staging, e))
}

async fn discard_staging(staging: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(staging).await {
        tracing::warn!(dir = %staging.display(), error = %e, "failed to remove staging directory");
    }
}

/// Move a completed staging directory to its week directory. A week
/// directory that exists without a contiguous page run is replaced.
async fn publish(staging: &Path, week_dir: &Path) -> Result<(), AcquireError> {
    if tokio::fs::try_exists(week_dir).await.unwrap_or(false) {
        tracing::warn!(dir = %week_dir.display(), "replacing incomplete week directory");
        tokio::fs::remove_dir_all(week_dir)
            .await
            .map_err(|e| AcquireError::io(week_dir, e))?;
    }
    tokio::fs::rename(staging, week_dir)
        .await
        .map_err(|e| AcquireError::io(week_dir, e))
}

/// `<download_root>/<site>/<week_key>`
#[must_use]
pub fn week_directory(root: &Path, site: &str, week_key: &WeekKey) -> PathBuf {
    root.join(site).join(week_key.to_string())
}
