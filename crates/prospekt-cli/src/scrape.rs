//! `scrape` subcommand: resolve the requested sites, run them one after
//! another, and report the results.

use std::path::PathBuf;

use chrono::Local;
use clap::{ArgGroup, Args};

use prospekt_core::{AcquisitionConfig, Site};
use prospekt_scraper::{strategy_for_url, ScrapeResult};

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["site", "url", "all"]),
))]
pub(crate) struct ScrapeArgs {
    /// Retailer key (lidl, angebote, netto)
    #[arg(long)]
    pub site: Option<String>,

    /// Explicit start URL on a supported retailer's domain
    #[arg(long)]
    pub url: Option<String>,

    /// Scrape every supported retailer in turn
    #[arg(long)]
    pub all: bool,

    /// Root directory for downloaded pages (overrides `PROSPEKT_DOWNLOAD_ROOT`)
    #[arg(long)]
    pub download_path: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Upper bound on viewer pages per flyer
    #[arg(long, value_parser = parse_max_pages)]
    pub max_pages: Option<usize>,

    /// Use a downloadable PDF instead of viewer images when one is offered
    #[arg(long)]
    pub prefer_document: bool,

    /// Print results as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

/// One resolved unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScrapeRequest {
    Site(Site),
    Url(String),
}

impl ScrapeRequest {
    fn label(&self) -> &str {
        match self {
            ScrapeRequest::Site(site) => site.key(),
            ScrapeRequest::Url(url) => url,
        }
    }
}

impl ScrapeArgs {
    /// Overlay command-line flags onto the environment-derived config.
    pub(crate) fn apply_to(&self, config: &mut AcquisitionConfig) {
        if let Some(path) = &self.download_path {
            config.download_root.clone_from(path);
        }
        if self.headed {
            config.headless = false;
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if self.prefer_document {
            config.prefer_document_over_images = true;
        }
    }

    /// Resolve and validate every requested site before any browser starts.
    pub(crate) fn requests(&self) -> anyhow::Result<Vec<ScrapeRequest>> {
        if self.all {
            return Ok(Site::ALL.into_iter().map(ScrapeRequest::Site).collect());
        }
        if let Some(key) = &self.site {
            return Ok(vec![ScrapeRequest::Site(Site::from_key(key)?)]);
        }
        if let Some(url) = &self.url {
            strategy_for_url(url)?;
            return Ok(vec![ScrapeRequest::Url(url.clone())]);
        }
        anyhow::bail!("one of --site, --url or --all is required")
    }
}

fn parse_max_pages(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Run every request in order. Returns `true` when all runs succeeded.
pub(crate) async fn run_scrape(args: &ScrapeArgs, mut config: AcquisitionConfig) -> anyhow::Result<bool> {
    args.apply_to(&mut config);
    let requests = args.requests()?;
    let today = Local::now().date_naive();

    let mut runs: Vec<(String, ScrapeResult)> = Vec::with_capacity(requests.len());
    for request in &requests {
        tracing::info!(site = request.label(), %today, "starting scrape");
        let result = match request {
            ScrapeRequest::Site(site) => prospekt_scraper::scrape_site(site.key(), &config, today).await?,
            ScrapeRequest::Url(url) => prospekt_scraper::scrape_url(url, &config, today).await?,
        };
        if !args.json {
            print_summary(request.label(), &result);
        }
        runs.push((request.label().to_string(), result));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&runs_to_json(&runs))?);
    }

    let failed = runs.iter().filter(|(_, r)| !r.success).count();
    if failed > 0 {
        tracing::warn!(failed, total = runs.len(), "some scrapes failed");
    }
    Ok(failed == 0)
}

fn runs_to_json(runs: &[(String, ScrapeResult)]) -> serde_json::Value {
    serde_json::Value::Array(
        runs.iter()
            .map(|(label, result)| serde_json::json!({ "site": label, "result": result }))
            .collect(),
    )
}

fn print_summary(label: &str, result: &ScrapeResult) {
    if result.success {
        let dir = result
            .download_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_default();
        println!("{label}: {} page(s) in {dir}", result.page_count());
    } else {
        println!(
            "{label}: failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
}

pub(crate) fn print_sites() {
    for site in Site::ALL {
        println!("{:<10} {}", site.key(), site.start_url());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_to_json_wraps_each_result_with_its_site() {
        let runs = vec![(
            "lidl".to_string(),
            ScrapeResult::failed("Could not find any scrapable content", None),
        )];
        let json = runs_to_json(&runs);
        assert_eq!(json[0]["site"], "lidl");
        assert_eq!(json[0]["result"]["success"], false);
        assert_eq!(
            json[0]["result"]["error"],
            "Could not find any scrapable content"
        );
    }

    #[test]
    fn parse_max_pages_rejects_zero_and_garbage() {
        assert_eq!(parse_max_pages("12"), Ok(12));
        assert!(parse_max_pages("0").is_err());
        assert!(parse_max_pages("many").is_err());
    }
}
