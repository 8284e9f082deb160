//! govee - discover and control Govee BLE lights

use clap::Parser;
use tracing::{error, info};

use govee_cli::{cli::Cli, commands::CommandDispatcher, config::AppConfig, error::Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    setup_logging(cli.verbose);

    // Load configuration
    let config = load_configuration(&cli)?;

    let target = cli.command.address().map(str::to_string);
    if let Err(e) = CommandDispatcher::execute(cli.command, config).await {
        match target {
            Some(address) => error!("Command for {} failed: {}", address, e),
            None => error!("Command failed: {}", e),
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Setup logging based on verbosity level
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration from file or use defaults
fn load_configuration(cli: &Cli) -> Result<AppConfig> {
    if let Some(config_path) = &cli.config {
        info!("Loading configuration from: {}", config_path);
        Ok(AppConfig::load_from_file(config_path)?)
    } else {
        Ok(AppConfig::load_default()?)
    }
}
