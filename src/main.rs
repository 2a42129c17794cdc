//! Admit-Harvest main entry point
//!
//! Command-line interface for the admission-results scrape pipeline.

use admit_harvest::checkpoint::load_checkpoint;
use admit_harvest::config::load_config_with_hash;
use admit_harvest::output::{compute_coverage, print_coverage, read_records};
use admit_harvest::scrape::Coordinator;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Admit-Harvest: an admission-results collector
///
/// Admit-Harvest walks a paginated survey listing, enriches each entry from
/// its detail page, and writes the normalized records to a JSON file. It
/// checks the site's robots policy before fetching anything and paces its
/// requests.
#[derive(Parser, Debug)]
#[command(name = "admit-harvest")]
#[command(version = "0.1.0")]
#[command(about = "An admission-results collector", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Seed the run with entries from a previous checkpoint file
    #[arg(long, value_name = "CHECKPOINT")]
    resume_from: Option<PathBuf>,

    /// Override the configured entry target
    #[arg(long, value_name = "N")]
    max_entries: Option<usize>,

    /// Override the configured starting page
    #[arg(long, value_name = "PAGE")]
    start_page: Option<u32>,

    /// Validate config and show what would be scraped without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show field coverage for an existing output file and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(n) = cli.max_entries {
        config.scrape.max_entries = n;
    }
    if let Some(page) = cli.start_page {
        config.scrape.start_page = page;
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_scrape(config, cli.resume_from).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("admit_harvest=info,warn"),
            1 => EnvFilter::new("admit_harvest=debug,info"),
            2 => EnvFilter::new("admit_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &admit_harvest::Config) {
    println!("=== Admit-Harvest Dry Run ===\n");

    println!("Scrape Configuration:");
    println!("  Target entries: {}", config.scrape.max_entries);
    println!("  Starting page: {}", config.scrape.start_page);
    println!("  Detail workers: {}", config.scrape.worker_count);
    println!("  Page delay: {}s", config.scrape.page_delay_seconds);
    println!("  Detail delay: {}s", config.scrape.detail_delay_seconds);
    println!(
        "  Checkpoint every: {} pages",
        config.scrape.checkpoint_interval_pages
    );
    println!(
        "  Robots fetch failure: {}",
        if config.scrape.fail_open {
            "permit (fail-open)"
        } else {
            "deny"
        }
    );

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nEndpoints:");
    println!("  Base URL: {}", config.endpoints.base_url);
    println!("  Listing path: {}", config.endpoints.listing_path);

    println!("\nOutput:");
    println!("  Data: {}", config.output.data_path);
    println!("  Checkpoint: {}", config.output.checkpoint_path);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would collect up to {} entries starting at page {}",
        config.scrape.max_entries, config.scrape.start_page
    );
}

/// Handles the --stats mode: coverage report over an existing output file
fn handle_stats(config: &admit_harvest::Config) -> anyhow::Result<()> {
    use std::path::Path;

    println!("Data file: {}\n", config.output.data_path);

    let records = read_records(Path::new(&config.output.data_path))?;
    let coverage = compute_coverage(&records);
    print_coverage(&coverage);

    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(
    config: admit_harvest::Config,
    resume_from: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut coordinator = Coordinator::new(config)?;

    if let Some(path) = resume_from {
        let state = load_checkpoint(&path)?;
        tracing::info!(
            "Resuming with {} entries from checkpoint through page {} ({})",
            state.entries.len(),
            state.last_page,
            state.timestamp
        );
        coordinator = coordinator.with_seed(state.entries);
    }

    let summary = coordinator.run().await?;
    tracing::info!(
        "Run complete ({:?}): {} records written",
        summary.end,
        summary.records_written
    );

    Ok(())
}
