pub mod app_config;
pub mod config;
pub mod site;
pub mod week;

pub use app_config::{AcquisitionConfig, Viewport, DEFAULT_USER_AGENT};
pub use config::{load_acquisition_config, load_acquisition_config_from_env};
pub use site::Site;
pub use week::{WeekKey, WeekKeyError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("unknown site \"{0}\"")]
    UnknownSite(String),
}
