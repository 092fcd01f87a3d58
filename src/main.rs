//! Job-Harvest main entry point
//!
//! This is the command-line interface for the Job-Harvest scraper.

use clap::Parser;
use job_harvest::config::{load_config, validate, Config};
use job_harvest::{prepare_term, scrape};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Job-Harvest: scrape job postings for a search term into a CSV file
///
/// Job-Harvest counts the result pages for a query, fetches them
/// concurrently, extracts every posting and writes them to a CSV file.
#[derive(Parser, Debug)]
#[command(name = "job-harvest")]
#[command(version)]
#[command(about = "Scrape job postings into a CSV file", long_about = None)]
struct Cli {
    /// Search term
    #[arg(value_name = "TERM", required = true, num_args = 1..)]
    term: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output CSV file (overrides the configured path)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Maximum number of result pages fetched at once
    #[arg(long, value_name = "N")]
    max_pages_in_flight: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match load_effective_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    let term = prepare_term(&cli.term.join(" "));
    if term.is_empty() {
        tracing::error!("Search term is empty");
        return Err("search term is empty".into());
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling scrape");
            ctrl_c.cancel();
        }
    });

    match scrape(config, &term, cancel).await {
        Ok(report) => {
            tracing::info!(
                "Wrote {} postings for '{}' to {}",
                report.postings,
                report.term,
                report.output.display()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("job_harvest=info,warn"),
            1 => EnvFilter::new("job_harvest=debug,info"),
            2 => EnvFilter::new("job_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file (if any) and applies command-line overrides
fn load_effective_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };

    if let Some(output) = &cli.output {
        config.output.path = output.to_string_lossy().into_owned();
    }
    if let Some(pages) = cli.max_pages_in_flight {
        config.scraper.max_concurrent_pages = pages;
    }
    if let Some(timeout) = cli.timeout {
        config.scraper.request_timeout_secs = timeout;
    }

    validate(&config)?;
    Ok(config)
}
