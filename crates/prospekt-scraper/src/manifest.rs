//! Ordered, gap-free page file names for one flyer week.

use std::path::Path;

use serde::Serialize;

/// File name of the `n`-th page (1-indexed): `page_01.jpg`, `page_02.jpg`, …
#[must_use]
pub fn page_file_name(n: usize) -> String {
    format!("page_{n:02}.jpg")
}

/// Page file names in acquisition order. Entries are only ever appended
/// through [`DownloadManifest::next_file_name`], so the sequence is always
/// contiguous from `page_01.jpg`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DownloadManifest {
    pages: Vec<String>,
}

impl DownloadManifest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the next page would be stored under.
    #[must_use]
    pub fn next_file_name(&self) -> String {
        page_file_name(self.pages.len() + 1)
    }

    /// Record that the page named by [`Self::next_file_name`] was written.
    pub fn commit_next(&mut self) -> &str {
        let name = self.next_file_name();
        self.pages.push(name);
        self.pages.last().map_or("", String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    #[must_use]
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    /// Read the contiguous run of non-empty page files already present in
    /// `dir`, starting at `page_01.jpg` and stopping at the first gap.
    /// A missing directory yields an empty manifest.
    pub async fn scan(dir: &Path) -> Self {
        let mut manifest = Self::new();
        loop {
            let candidate = dir.join(manifest.next_file_name());
            match tokio::fs::metadata(&candidate).await {
                Ok(meta) if meta.is_file() && meta.len() > 0 => {
                    manifest.commit_next();
                }
                _ => break,
            }
        }
        manifest
    }
}
