//! Spidey main entry point
//!
//! This is the command-line interface for the Spidey crawler and indexer.

use anyhow::Context;
use clap::Parser;
use spidey::config::{load_config_with_hash, validate, Config, FetcherKind};
use spidey::crawler::crawl;
use spidey::output::{export, load_statistics, print_statistics};
use spidey::storage::SqliteStorage;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Spidey: a breadth-first crawler and inverted indexer
///
/// Spidey visits N distinct pages reachable from a seed URL, records the
/// link graph between them and builds a positional index of their title and
/// body text in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "spidey")]
#[command(version)]
#[command(about = "A breadth-first crawler and inverted indexer", long_about = None)]
struct Cli {
    /// URL the crawl starts from
    #[arg(value_name = "SEED_URL", required_unless_present = "stats")]
    seed_url: Option<String>,

    /// Number of distinct pages to visit
    #[arg(value_name = "TARGET_PAGES", required_unless_present = "stats")]
    target_pages: Option<usize>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database path (overrides the config file)
    #[arg(long, value_name = "FILE")]
    database: Option<String>,

    /// Markdown report path (overrides the config file)
    #[arg(long, value_name = "FILE")]
    report: Option<String>,

    /// Fetcher used to render pages: http or headless
    #[arg(long)]
    fetcher: Option<FetcherKind>,

    /// Stopword file, one word per line
    #[arg(long, value_name = "FILE")]
    stopwords: Option<String>,

    /// Show statistics from an existing database and exit
    #[arg(long)]
    stats: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_cli_config(&cli)?;

    if cli.stats {
        return handle_stats(&config);
    }

    match (cli.seed_url.as_deref(), cli.target_pages) {
        (Some(seed), Some(target)) => handle_crawl(config, seed, target).await,
        _ => anyhow::bail!("SEED_URL and TARGET_PAGES are required"),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("spidey=info,warn"),
            1 => EnvFilter::new("spidey=debug,info"),
            2 => EnvFilter::new("spidey=trace,debug"),
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

/// Loads the config file (if any), applies command-line overrides and validates
fn load_cli_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(database) = &cli.database {
        config.output.database_path = database.clone();
    }
    if let Some(report) = &cli.report {
        config.output.report_path = report.clone();
    }
    if let Some(fetcher) = cli.fetcher {
        config.crawler.fetcher = fetcher;
    }
    if let Some(stopwords) = &cli.stopwords {
        config.index.stopwords_path = Some(stopwords.clone());
    }

    validate(&config)?;
    Ok(config)
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let path = Path::new(&config.output.database_path);
    if !path.exists() {
        anyhow::bail!("no database at {}", path.display());
    }

    let storage = SqliteStorage::new(path)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, seed: &str, target: usize) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} pages from {} into {}",
        target,
        seed,
        config.output.database_path
    );

    let report_path = PathBuf::from(&config.output.report_path);

    let session = match crawl(config, seed, target).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    export(session.storage(), &report_path)?;
    println!("\n✓ Report exported to: {}", report_path.display());

    Ok(())
}
