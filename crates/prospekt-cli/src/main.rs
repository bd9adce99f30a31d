mod scrape;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use prospekt_core::{AcquisitionConfig, ConfigError};
use tracing_subscriber::EnvFilter;

use scrape::ScrapeArgs;

#[derive(Debug, Parser)]
#[command(name = "prospekt-cli")]
#[command(about = "Acquire weekly retail flyers as ordered page images")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download the current flyer of one or more retailers
    Scrape(ScrapeArgs),
    /// List supported retailers and their start pages
    Sites,
}

/// Log level used when no config is loaded and `RUST_LOG` is unset.
const DEFAULT_LOG_LEVEL: &str = "info";

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = config_for(&cli.command, prospekt_core::load_acquisition_config)?;

    let log_level = config
        .as_ref()
        .map_or(DEFAULT_LOG_LEVEL, |c| c.log_level.as_str());
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match (cli.command, config) {
        (Commands::Scrape(args), Some(config)) => {
            let all_succeeded = scrape::run_scrape(&args, config).await?;
            Ok(if all_succeeded {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        (Commands::Scrape(_), None) => anyhow::bail!("scrape requires a loaded configuration"),
        (Commands::Sites, _) => {
            scrape::print_sites();
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Load the acquisition config only for commands that read it.
fn config_for(
    command: &Commands,
    load: impl FnOnce() -> Result<AcquisitionConfig, ConfigError>,
) -> Result<Option<AcquisitionConfig>, ConfigError> {
    match command {
        Commands::Scrape(_) => load().map(Some),
        Commands::Sites => Ok(None),
    }
}

#[cfg(test)]
mod tests;
