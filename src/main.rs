//! # Showroom Main Entry Point
//!
//! Loads configuration, installs tracing and serves the back office.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use showroom::{config::ConfigLoader, server::run_server, telemetry};

#[derive(Parser, Debug)]
#[command(name = "showroom", about = "Showroom back-office server", version)]
struct Cli {
    /// Directory holding the layered `.env` files
    #[arg(long)]
    env_dir: Option<PathBuf>,

    /// Print the effective configuration (secrets redacted) and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let loader = match cli.env_dir {
        Some(dir) => ConfigLoader::with_base_dir(dir),
        None => ConfigLoader::new(),
    };
    let config = loader.load().context("loading configuration")?;

    if cli.print_config {
        println!("{}", config.redacted_json()?);
        return Ok(());
    }

    telemetry::init_tracing(&config).context("initializing tracing")?;
    tracing::info!(profile = %config.profile, "Configuration loaded");

    run_server(config).await
}
