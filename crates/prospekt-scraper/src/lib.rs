pub mod acquire;
pub mod browser;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod probe;
pub mod raster;
pub mod session;
pub mod strategy;
pub mod types;

use chrono::NaiveDate;

use prospekt_core::AcquisitionConfig;

pub use acquire::{week_directory, Acquisition, STALLED_PAGE_LIMIT};
pub use browser::ChromiumSession;
pub use error::{BrowserError, FetchError, RasterError, StrategyError};
pub use fetch::ResourceFetcher;
pub use manifest::{page_file_name, DownloadManifest};
pub use raster::{DocumentRasterizer, PdftoppmRasterizer, RASTER_DPI};
pub use session::{ElementSnapshot, Session};
pub use strategy::{strategy_for_key, strategy_for_site, strategy_for_url, SiteStrategy};
pub use types::{ScrapeResult, ScrapeTarget, TargetKind};

/// Acquire the current flyer of the site registered under `key`.
///
/// # Errors
///
/// Returns [`StrategyError`] for an unknown site key, before any browser is
/// launched. Every later failure is reported in the returned
/// [`ScrapeResult`].
pub async fn scrape_site(
    key: &str,
    config: &AcquisitionConfig,
    today: NaiveDate,
) -> Result<ScrapeResult, StrategyError> {
    let (start_url, strategy) = strategy_for_key(key)?;
    Ok(scrape_with(strategy.as_ref(), start_url, config, today).await)
}

/// Acquire the flyer reachable from an explicit start URL.
///
/// # Errors
///
/// Returns [`StrategyError::NoStrategyAvailable`] when no site handles the
/// URL's domain, before any browser is launched.
pub async fn scrape_url(
    url: &str,
    config: &AcquisitionConfig,
    today: NaiveDate,
) -> Result<ScrapeResult, StrategyError> {
    let strategy = strategy_for_url(url)?;
    Ok(scrape_with(strategy.as_ref(), url, config, today).await)
}

async fn scrape_with(
    strategy: &dyn SiteStrategy,
    start_url: &str,
    config: &AcquisitionConfig,
    today: NaiveDate,
) -> ScrapeResult {
    let fetcher = match ResourceFetcher::new(config.request_timeout, &config.user_agent) {
        Ok(fetcher) => fetcher,
        Err(e) => return ScrapeResult::failed(format!("failed to build HTTP client: {e}"), None),
    };
    let mut session = match ChromiumSession::launch(config).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(site = strategy.site().key(), error = %e, "browser launch failed");
            return ScrapeResult::failed(e.to_string(), None);
        }
    };
    let rasterizer = PdftoppmRasterizer::default();

    Acquisition::new(config, &fetcher, &rasterizer, today)
        .run(strategy, &mut session, start_url)
        .await
}
