//! car-scout main entry point
//!
//! This is the command-line interface for the car-scout listing search.

use anyhow::Context;
use car_scout::config::{load_config_with_hash, Config};
use car_scout::filter::{filter_results, FilterMethod, FilterOptions};
use car_scout::postal::suggest_postal;
use car_scout::{Orchestrator, SearchCriteria};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// car-scout: used-car classifieds search
///
/// Searches a classifieds marketplace by keywords and location, resolving
/// city names and postal codes into the best scraping strategy, and prints
/// the results as JSON.
#[derive(Parser, Debug)]
#[command(name = "car-scout")]
#[command(version)]
#[command(about = "Used-car classifieds search", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search listings and print them as JSON
    Search {
        /// Free text keywords
        #[arg(short, long, default_value = "")]
        keywords: String,

        /// City name, postal prefix or full postal code
        #[arg(short, long, default_value = "")]
        location: String,

        /// Return nothing rather than results outside the location
        #[arg(long)]
        strict: bool,

        /// Results per page (unsupported sizes fall back to the default)
        #[arg(long)]
        page_size: Option<usize>,

        /// Post-processing of the result list
        #[arg(long, default_value_t = FilterMethod::Dedupe)]
        filter: FilterMethod,

        /// Store the results in the configured database
        #[arg(long)]
        persist: bool,

        /// Print the route the search took along with the results
        #[arg(long)]
        explain: bool,
    },

    /// Suggest postal codes for a city name or partial code
    Suggest {
        /// City name or leading digits
        query: String,
    },

    /// Validate the configuration and print the effective settings
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_ref())?;

    match cli.command {
        Command::Search {
            keywords,
            location,
            strict,
            page_size,
            filter,
            persist,
            explain,
        } => {
            let mut criteria = SearchCriteria::new(keywords, location).strict(strict);
            criteria.page_size = page_size;
            criteria.persist = persist;
            handle_search(&config, criteria, filter, explain).await
        }
        Command::Suggest { query } => handle_suggest(&query),
        Command::CheckConfig => handle_check_config(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so that stdout carries only JSON.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("car_scout=info,warn"),
            1 => EnvFilter::new("car_scout=debug,info"),
            2 => EnvFilter::new("car_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Handles the search command
async fn handle_search(
    config: &Config,
    criteria: SearchCriteria,
    method: FilterMethod,
    explain: bool,
) -> anyhow::Result<()> {
    if criteria.persist && config.persistence.is_none() {
        tracing::warn!("--persist given but the configuration has no [persistence] section");
    }

    let orchestrator =
        Orchestrator::from_config(config).context("failed to set up the search pipeline")?;
    let outcome = orchestrator.search(&criteria).await;
    orchestrator.flush().await;

    let options = FilterOptions {
        method,
        keywords: criteria.keywords.clone(),
        sample_size: config.search.sample_size,
    };
    let results = filter_results(outcome.results, &options);

    let json = if explain {
        serde_json::to_string_pretty(&serde_json::json!({
            "path": outcome.path,
            "results": results,
        }))?
    } else {
        serde_json::to_string_pretty(&results)?
    };
    println!("{}", json);

    Ok(())
}

/// Handles the suggest command
fn handle_suggest(query: &str) -> anyhow::Result<()> {
    let suggestions = suggest_postal(query);
    if suggestions.is_empty() {
        tracing::info!("No postal codes found for '{}'", query);
    }
    println!("{}", serde_json::to_string_pretty(&suggestions)?);
    Ok(())
}

/// Handles the check-config command
fn handle_check_config(config: &Config) -> anyhow::Result<()> {
    println!("=== car-scout configuration ===\n");

    println!("Source:");
    println!("  Base URL: {}", config.source.base_url);
    println!("  Detail pattern: {}", config.source.detail_pattern);
    println!("  Radius: {} km", config.source.radius_km);

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Request timeout: {}ms", config.http.request_timeout_ms);
    println!("  Detail timeout: {}ms", config.http.detail_timeout_ms);

    let search = &config.search;
    println!("\nSearch:");
    println!(
        "  Page sizes: {:?} (default {})",
        search.allowed_page_sizes, search.default_page_size
    );
    println!("  Extract limit: {}", search.extract_limit);
    println!("  Minimum acceptable matches: {}", search.min_acceptable_matches);
    println!("  Minimum bare price: {}", search.min_bare_price);
    println!(
        "  Concurrency: {} enrichment, {} scrapes",
        search.enrich_concurrency, search.scrape_concurrency
    );
    println!(
        "  Postal expansion: {} codes, up to {}",
        search.expansion_initial, search.expansion_max
    );

    match &config.index {
        Some(index) => println!("\nIndex: {} ({})", index.url, index.index_name),
        None => println!("\nIndex: none"),
    }
    match &config.persistence {
        Some(persistence) => println!("Database: {}", persistence.database_path),
        None => println!("Database: none"),
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}
