//! probe-report
//!
//! Inspect a media container and emit a structured, machine-readable report
//! describing its format, streams and per-stream metadata.
//!
//! # Usage
//!
//! ```bash
//! probe-report probe --input movie.mkv --show-entries stream=index,codec_name
//! probe-report probe --input clip.json --source fixture --compact --output report.json
//! probe-report sections
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use probe_report::cli::{commands, Cli, Commands};
use probe_report::config_initialization::initialize_configuration_hierarchy;
use probe_report::utils::logging::LoggingSystem;

/// Main entry point for the probe-report CLI application
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Resolve configuration, then start logging with the resolved level
    let config = initialize_configuration_hierarchy(&cli)?;
    let logging = LoggingSystem::new(config.logging_config());
    logging.initialize()?;
    logging.log_system_info();
    config.log_summary();

    // Execute the requested command
    match cli.command {
        Commands::Probe(args) => {
            info!("Executing probe command");
            commands::probe(args, &config).await?;
        }
        Commands::Sections(args) => {
            info!("Executing sections command");
            commands::sections(args)?;
        }
    }

    info!("probe-report completed successfully");
    Ok(())
}
