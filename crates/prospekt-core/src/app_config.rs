use std::path::PathBuf;
use std::time::Duration;

/// Browser viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 960,
            height: 1080,
        }
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for Viewport {
    type Err = String;

    /// Accepts `960x1080` and the older `960,1080` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X', ','])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got \"{s}\""))?;
        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid width \"{w}\": {e}"))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid height \"{h}\": {e}"))?;
        if width == 0 || height == 0 {
            return Err(format!("viewport dimensions must be non-zero, got \"{s}\""));
        }
        Ok(Self { width, height })
    }
}

/// Settings for one acquisition run. Built once per invocation and shared
/// read-only with every site strategy.
#[derive(Debug, Clone)]
pub struct AcquisitionConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub max_pages: usize,
    /// Bounded wait applied to each individual DOM probe.
    pub page_timeout: Duration,
    pub download_root: PathBuf,
    pub prefer_document_over_images: bool,
    pub user_agent: String,
    pub request_timeout: Duration,
    /// Pause after each navigation before the page is read.
    pub settle_delay: Duration,
    pub chrome_executable: Option<PathBuf>,
    pub log_level: String,
}

/// Desktop Chrome identity used for image and document downloads.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            max_pages: 100,
            page_timeout: Duration::from_secs(10),
            download_root: PathBuf::from("data/originals"),
            prefer_document_over_images: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_millis(1000),
            chrome_executable: None,
            log_level: "info".to_string(),
        }
    }
}
