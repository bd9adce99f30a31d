use std::path::PathBuf;
use std::time::Duration;

use crate::app_config::{AcquisitionConfig, Viewport, DEFAULT_USER_AGENT};
use crate::ConfigError;

/// Load acquisition configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but cannot be parsed.
pub fn load_acquisition_config() -> Result<AcquisitionConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_acquisition_config_from_env()
}

/// Load acquisition configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but cannot be parsed.
pub fn load_acquisition_config_from_env() -> Result<AcquisitionConfig, ConfigError> {
    build_acquisition_config(|key| std::env::var(key))
}

/// Build configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_acquisition_config<F>(lookup: F) -> Result<AcquisitionConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_flag(&or_default(var, default)).ok_or_else(|| {
            invalid(
                var,
                "expected one of true/false/1/0/yes/no/on/off".to_string(),
            )
        })
    };

    let headless = parse_bool("PROSPEKT_HEADLESS", "true")?;
    let viewport = or_default("PROSPEKT_VIEWPORT", "960x1080")
        .parse::<Viewport>()
        .map_err(|reason| invalid("PROSPEKT_VIEWPORT", reason))?;

    let max_pages = parse_usize("PROSPEKT_MAX_PAGES", "100")?;
    if max_pages == 0 {
        return Err(invalid(
            "PROSPEKT_MAX_PAGES",
            "must be at least 1".to_string(),
        ));
    }

    let page_timeout_secs = parse_u64("PROSPEKT_PAGE_TIMEOUT_SECS", "10")?;
    let download_root = PathBuf::from(or_default("PROSPEKT_DOWNLOAD_ROOT", "data/originals"));
    let prefer_document_over_images = parse_bool("PROSPEKT_PREFER_DOCUMENT", "false")?;
    let user_agent = or_default("PROSPEKT_USER_AGENT", DEFAULT_USER_AGENT);
    let request_timeout_secs = parse_u64("PROSPEKT_REQUEST_TIMEOUT_SECS", "30")?;
    let settle_delay_ms = parse_u64("PROSPEKT_SETTLE_DELAY_MS", "1000")?;
    let chrome_executable = lookup("PROSPEKT_CHROME_EXECUTABLE")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let log_level = or_default("PROSPEKT_LOG_LEVEL", "info");

    Ok(AcquisitionConfig {
        headless,
        viewport,
        max_pages,
        page_timeout: Duration::from_secs(page_timeout_secs),
        download_root,
        prefer_document_over_images,
        user_agent,
        request_timeout: Duration::from_secs(request_timeout_secs),
        settle_delay: Duration::from_millis(settle_delay_ms),
        chrome_executable,
        log_level,
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
