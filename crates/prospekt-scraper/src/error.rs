use thiserror::Error;

/// Construction-time misconfiguration. Raised before any browser session is
/// opened and never retried.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("no scraper available for URL: {url}")]
    NoStrategyAvailable { url: String },

    #[error(transparent)]
    Config(#[from] prospekt_core::ConfigError),
}

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("browser protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("script evaluation failed for selector {selector}: {reason}")]
    Script { selector: String, reason: String },

    #[error("no element #{index} matches selector {selector}")]
    NoSuchElement { selector: String, index: usize },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("empty response body from {url}")]
    EmptyBody { url: String },

    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("{binary} not found; install poppler-utils to rasterize PDF flyers")]
    BinaryNotFound { binary: String },

    #[error("{binary} exited with {status}: {stderr}")]
    ProcessFailed {
        binary: String,
        status: String,
        stderr: String,
    },

    #[error("document {path} produced no pages")]
    NoPages { path: String },

    #[error("I/O error during rasterization: {0}")]
    Io(#[from] std::io::Error),
}
