use super::*;

use std::path::PathBuf;

use prospekt_core::{AcquisitionConfig, ConfigError, Site};
use scrape::ScrapeRequest;

fn bad_env() -> Result<AcquisitionConfig, ConfigError> {
    Err(ConfigError::InvalidEnvVar {
        var: "PROSPEKT_MAX_PAGES".to_string(),
        reason: "invalid digit found in string".to_string(),
    })
}

fn scrape_args(argv: &[&str]) -> ScrapeArgs {
    let cli = Cli::try_parse_from(argv).expect("expected valid cli args");
    match cli.command {
        Commands::Scrape(args) => args,
        Commands::Sites => panic!("expected scrape command"),
    }
}

#[test]
fn parses_scrape_with_site() {
    let args = scrape_args(&["prospekt-cli", "scrape", "--site", "lidl"]);
    assert_eq!(args.site.as_deref(), Some("lidl"));
    assert!(!args.all);
    assert_eq!(
        args.requests().unwrap(),
        [ScrapeRequest::Site(Site::Lidl)]
    );
}

#[test]
fn parses_sites_command() {
    let cli = Cli::try_parse_from(["prospekt-cli", "sites"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Sites));
}

#[test]
fn scrape_requires_a_source() {
    assert!(Cli::try_parse_from(["prospekt-cli", "scrape"]).is_err());
}

#[test]
fn scrape_sources_are_mutually_exclusive() {
    assert!(Cli::try_parse_from(["prospekt-cli", "scrape", "--site", "lidl", "--all"]).is_err());
    assert!(Cli::try_parse_from([
        "prospekt-cli",
        "scrape",
        "--site",
        "lidl",
        "--url",
        "https://www.lidl.de/"
    ])
    .is_err());
}

#[test]
fn all_expands_to_every_site_in_priority_order() {
    let args = scrape_args(&["prospekt-cli", "scrape", "--all"]);
    assert_eq!(
        args.requests().unwrap(),
        [
            ScrapeRequest::Site(Site::Lidl),
            ScrapeRequest::Site(Site::Angebote),
            ScrapeRequest::Site(Site::Netto)
        ]
    );
}

#[test]
fn unknown_site_fails_before_scraping() {
    let args = scrape_args(&["prospekt-cli", "scrape", "--site", "aldi"]);
    let err = args.requests().unwrap_err();
    assert!(err.to_string().contains("aldi"), "got: {err}");
}

#[test]
fn unsupported_url_fails_before_scraping() {
    let args = scrape_args(&["prospekt-cli", "scrape", "--url", "https://www.aldi-sued.de/"]);
    let err = args.requests().unwrap_err();
    assert!(err.to_string().contains("no scraper available"), "got: {err}");
}

#[test]
fn supported_url_is_kept_verbatim() {
    let url = "https://angebote.com/lidl/archives?page=2";
    let args = scrape_args(&["prospekt-cli", "scrape", "--url", url]);
    assert_eq!(args.requests().unwrap(), [ScrapeRequest::Url(url.to_string())]);
}

#[test]
fn flags_override_loaded_config() {
    let args = scrape_args(&[
        "prospekt-cli",
        "scrape",
        "--site",
        "netto",
        "--download-path",
        "/tmp/flyers",
        "--headed",
        "--max-pages",
        "7",
        "--prefer-document",
        "--json",
    ]);
    let mut config = AcquisitionConfig::default();
    args.apply_to(&mut config);

    assert_eq!(config.download_root, PathBuf::from("/tmp/flyers"));
    assert!(!config.headless);
    assert_eq!(config.max_pages, 7);
    assert!(config.prefer_document_over_images);
    assert!(args.json);
}

#[test]
fn absent_flags_leave_config_untouched() {
    let args = scrape_args(&["prospekt-cli", "scrape", "--site", "lidl"]);
    let mut config = AcquisitionConfig::default();
    args.apply_to(&mut config);

    let defaults = AcquisitionConfig::default();
    assert_eq!(config.download_root, defaults.download_root);
    assert_eq!(config.headless, defaults.headless);
    assert_eq!(config.max_pages, defaults.max_pages);
}

#[test]
fn zero_max_pages_is_rejected() {
    assert!(
        Cli::try_parse_from(["prospekt-cli", "scrape", "--all", "--max-pages", "0"]).is_err()
    );
}

#[test]
fn sites_command_ignores_invalid_environment() {
    let cli = Cli::try_parse_from(["prospekt-cli", "sites"]).expect("expected valid cli args");
    assert!(config_for(&cli.command, bad_env).unwrap().is_none());
}

#[test]
fn scrape_command_surfaces_invalid_environment() {
    let cli = Cli::try_parse_from(["prospekt-cli", "scrape", "--all"]).expect("expected valid cli args");
    let err = config_for(&cli.command, bad_env).unwrap_err();
    assert!(err.to_string().contains("PROSPEKT_MAX_PAGES"), "got: {err}");
}

#[test]
fn scrape_command_loads_configuration() {
    let cli = Cli::try_parse_from(["prospekt-cli", "scrape", "--all"]).expect("expected valid cli args");
    let config = config_for(&cli.command, || Ok(AcquisitionConfig::default())).unwrap();
    assert_eq!(config.map(|c| c.max_pages), Some(100));
}
