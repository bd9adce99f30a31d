//! Values produced by discovery and returned from an acquisition run.

use std::path::PathBuf;

use serde::Serialize;

use prospekt_core::WeekKey;

use crate::manifest::DownloadManifest;

/// How a flyer's pages are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Pages are rendered by a browser viewer and paged through one at a time.
    PagedViewer,
    /// A single multi-page document (PDF) that is downloaded and rasterized.
    Document,
}

/// A flyer found on a retailer's listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeTarget {
    pub label: String,
    pub url: String,
    pub kind: TargetKind,
}

impl ScrapeTarget {
    #[must_use]
    pub fn new(label: impl Into<String>, url: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            kind,
        }
    }
}

/// Outcome of one acquisition run.
///
/// `success` implies a non-empty `downloaded_pages` stored under
/// `download_dir`. On failure `error` holds a human-readable reason and
/// `download_dir` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeResult {
    pub success: bool,
    pub downloaded_pages: DownloadManifest,
    pub download_dir: Option<PathBuf>,
    pub week_key: Option<WeekKey>,
    pub error: Option<String>,
}

impl ScrapeResult {
    #[must_use]
    pub fn succeeded(manifest: DownloadManifest, dir: PathBuf, week_key: WeekKey) -> Self {
        Self {
            success: true,
            downloaded_pages: manifest,
            download_dir: Some(dir),
            week_key: Some(week_key),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>, week_key: Option<WeekKey>) -> Self {
        Self {
            success: false,
            downloaded_pages: DownloadManifest::new(),
            download_dir: None,
            week_key,
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.downloaded_pages.len()
    }
}
