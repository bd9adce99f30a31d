use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_acquisition_config_uses_defaults_when_env_is_empty() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_acquisition_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.headless);
    assert_eq!(cfg.viewport, Viewport { width: 960, height: 1080 });
    assert_eq!(cfg.max_pages, 100);
    assert_eq!(cfg.page_timeout, Duration::from_secs(10));
    assert_eq!(cfg.download_root, PathBuf::from("data/originals"));
    assert!(!cfg.prefer_document_over_images);
    assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(cfg.request_timeout, Duration::from_secs(30));
    assert_eq!(cfg.settle_delay, Duration::from_millis(1000));
    assert!(cfg.chrome_executable.is_none());
    assert_eq!(cfg.log_level, "info");
}

#[test]
fn build_acquisition_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("PROSPEKT_HEADLESS", "false");
    map.insert("PROSPEKT_VIEWPORT", "1280x2000");
    map.insert("PROSPEKT_MAX_PAGES", "12");
    map.insert("PROSPEKT_DOWNLOAD_ROOT", "/tmp/flyers");
    map.insert("PROSPEKT_PREFER_DOCUMENT", "yes");
    map.insert("PROSPEKT_SETTLE_DELAY_MS", "0");
    map.insert("PROSPEKT_CHROME_EXECUTABLE", "/usr/bin/chromium");
    let cfg = build_acquisition_config(lookup_from_map(&map)).unwrap();
    assert!(!cfg.headless);
    assert_eq!(
        cfg.viewport,
        Viewport {
            width: 1280,
            height: 2000
        }
    );
    assert_eq!(cfg.max_pages, 12);
    assert_eq!(cfg.download_root, PathBuf::from("/tmp/flyers"));
    assert!(cfg.prefer_document_over_images);
    assert_eq!(cfg.settle_delay, Duration::ZERO);
    assert_eq!(
        cfg.chrome_executable.as_deref(),
        Some(std::path::Path::new("/usr/bin/chromium"))
    );
}

#[test]
fn viewport_accepts_legacy_comma_form() {
    let mut map = HashMap::new();
    map.insert("PROSPEKT_VIEWPORT", "960,1080");
    let cfg = build_acquisition_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.viewport.to_string(), "960x1080");
}

#[test]
fn build_acquisition_config_rejects_invalid_viewport() {
    let mut map = HashMap::new();
    map.insert("PROSPEKT_VIEWPORT", "wide");
    let result = build_acquisition_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PROSPEKT_VIEWPORT"),
        "expected InvalidEnvVar(PROSPEKT_VIEWPORT), got: {result:?}"
    );
}

#[test]
fn build_acquisition_config_rejects_zero_viewport_dimension() {
    let mut map = HashMap::new();
    map.insert("PROSPEKT_VIEWPORT", "0x1080");
    let result = build_acquisition_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
}

#[test]
fn build_acquisition_config_rejects_invalid_max_pages() {
    let mut map = HashMap::new();
    map.insert("PROSPEKT_MAX_PAGES", "not-a-number");
    let result = build_acquisition_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PROSPEKT_MAX_PAGES"),
        "expected InvalidEnvVar(PROSPEKT_MAX_PAGES), got: {result:?}"
    );
}

#[test]
fn build_acquisition_config_rejects_zero_max_pages() {
    let mut map = HashMap::new();
    map.insert("PROSPEKT_MAX_PAGES", "0");
    let result = build_acquisition_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PROSPEKT_MAX_PAGES"),
        "expected InvalidEnvVar(PROSPEKT_MAX_PAGES), got: {result:?}"
    );
}

#[test]
fn build_acquisition_config_rejects_invalid_flag() {
    let mut map = HashMap::new();
    map.insert("PROSPEKT_HEADLESS", "maybe");
    let result = build_acquisition_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PROSPEKT_HEADLESS"),
        "expected InvalidEnvVar(PROSPEKT_HEADLESS), got: {result:?}"
    );
}

#[test]
fn blank_chrome_executable_is_ignored() {
    let mut map = HashMap::new();
    map.insert("PROSPEKT_CHROME_EXECUTABLE", "  ");
    let cfg = build_acquisition_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.chrome_executable.is_none());
}

#[test]
fn parse_flag_accepts_common_spellings() {
    assert_eq!(parse_flag("TRUE"), Some(true));
    assert_eq!(parse_flag(" on "), Some(true));
    assert_eq!(parse_flag("0"), Some(false));
    assert_eq!(parse_flag("No"), Some(false));
    assert_eq!(parse_flag(""), None);
}
