// src/main.rs

//! DeFi Insights CLI
//!
//! Processes captured post fragments through the classify-and-persist
//! pipeline. Page rendering and login are handled by the external browser
//! layer; this binary consumes its capture files.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use defi_insights::{
    error::{AppError, Result},
    models::Config,
    pipeline::Pipeline,
    services::{ClassifierAdapter, OpenAiClassifier},
    sources::CaptureDirSource,
    storage::PgSink,
};

/// DeFi Insights - post classification pipeline
#[derive(Parser, Debug)]
#[command(
    name = "defi-insights",
    version,
    about = "Classifies captured DeFi posts and persists insights"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline over all configured queries
    Run {
        /// Directory holding per-query fragment captures
        #[arg(long, default_value = "captures")]
        captures: PathBuf,
    },

    /// Validate the configuration file
    Validate,

    /// Create the insights table and idempotency index
    InitDb,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Read a required secret from the environment.
fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::config(format!("{name} is not set")))
}

/// Main entry point for the CLI application.
///
/// Only bootstrap failures (bad config, unreachable sink, missing API key)
/// produce a nonzero exit; per-item failures end up in the run report.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "Config OK ({} queries, model {})",
                config.crawler.queries.len(),
                config.classifier.model
            );
        }

        Command::InitDb => {
            config.validate()?;
            let database_url = require_env("DATABASE_URL")?;
            let sink = PgSink::connect(&database_url, &config.sink).await?;
            sink.ensure_schema().await?;
        }

        Command::Run { captures } => {
            config.validate()?;

            let database_url = require_env("DATABASE_URL")?;
            let api_key = require_env("OPENAI_API_KEY")?;

            let sink = PgSink::connect(&database_url, &config.sink).await?;
            sink.ensure_schema().await?;
            log::info!("Connected to sink");

            let classifier =
                ClassifierAdapter::new(OpenAiClassifier::new(&config.classifier, &api_key)?);
            let source = CaptureDirSource::new(&captures);

            log::info!(
                "Starting run over {} queries from {}",
                config.crawler.queries.len(),
                captures.display()
            );

            let pipeline = Pipeline::new(config, source, classifier, sink);
            let report = pipeline.run().await?;
            report.log_summary();
        }
    }

    log::info!("Done!");

    Ok(())
}
