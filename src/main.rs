//! Gantry - container build and readiness-wait toolchain
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use gantry::cli::{Cli, Commands};
use gantry::config::ConfigManager;
use gantry::error::GantryResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> GantryResult<()> {
    let cli = Cli::parse();

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    // Initialize logging: 0 = warn (progress bars only), 1 = info, 2+ = debug
    let verbose = if config.general.verbose {
        cli.verbose.max(1)
    } else {
        cli.verbose
    };
    let filter = match verbose {
        0 => EnvFilter::new("gantry=warn"),
        1 => EnvFilter::new("gantry=info"),
        _ => EnvFilter::new("gantry=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }

    debug!("Using config from {}", config_manager.path().display());

    match cli.command {
        Commands::Build(args) => gantry::cli::commands::build(args, &config).await,
        Commands::Pull(args) => gantry::cli::commands::pull(args, &config).await,
        Commands::Push(args) => gantry::cli::commands::push(args, &config).await,
        Commands::Run(args) => gantry::cli::commands::run(args, &config).await,
        Commands::Status => gantry::cli::commands::status(&config).await,
    }
}
