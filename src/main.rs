use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use terastore::commands::Command;
use terastore::config::RuntimeConfig;

/// Command-line client for the TeraStore pulse database
#[derive(Parser)]
#[command(name = "terastore")]
#[command(version)]
#[command(about = "Command-line client for the TeraStore pulse database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Backend URL (overrides config file and environment)
    #[arg(short, long, value_name = "URL", global = true)]
    backend_url: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Step 1: Load base configuration
    let mut config = if let Some(config_path) = &cli.config {
        RuntimeConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        RuntimeConfig::load_or_default().context("Failed to load configuration")?
    };

    // Step 2: Apply CLI overrides (highest priority)
    apply_cli_overrides(&mut config, &cli);
    config.validate()?;

    // Step 3: Initialize tracing before any backend call
    terastore::init_tracing(&config);

    // Step 4: Run the subcommand
    cli.command.run(&config).await
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) {
    if let Some(url) = &cli.backend_url {
        config.backend.url = url.clone();
    }

    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
}
