//! Pattern-Crawl main entry point
//!
//! This is the command-line interface for the Pattern-Crawl site scanner.

use anyhow::Context;
use clap::Parser;
use pattern_crawl::config::{load_config_with_hash, Config};
use pattern_crawl::crawler::run_crawl;
use pattern_crawl::output::write_json_reports;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Pattern-Crawl: targeted pattern extraction from small websites
///
/// Pattern-Crawl visits a site from each seed address, follows its frames
/// and the most promising links, and reports every match of the configured
/// search patterns.
#[derive(Parser, Debug)]
#[command(name = "pattern-crawl")]
#[command(version = "1.0.0")]
#[command(about = "Targeted pattern extraction from small websites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Sites to crawl, with or without scheme (e.g. www.example.nl)
    #[arg(value_name = "SEED", required = true)]
    seeds: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Write all reports as a JSON array to this file
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Fetch every page live, ignoring the page cache
    #[arg(long)]
    no_cache: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.no_cache {
        config.cache.enabled = false;
    }

    if cli.dry_run {
        handle_dry_run(&config, &cli.seeds);
        return Ok(());
    }

    let reports = run_crawl(config, &cli.seeds)
        .await
        .context("Crawl failed")?;

    for report in &reports {
        println!("{}", report);
    }

    if let Some(path) = &cli.json {
        write_json_reports(path, &reports)
            .with_context(|| format!("Failed to write reports to {}", path.display()))?;
        tracing::info!("Wrote {} reports to {}", reports.len(), path.display());
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pattern_crawl=info,warn"),
            1 => EnvFilter::new("pattern_crawl=debug,info"),
            2 => EnvFilter::new("pattern_crawl=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, seeds: &[String]) {
    println!("=== Pattern-Crawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max frames: {}", config.crawler.max_frames);
    println!("  Max hrefs: {}", config.crawler.max_hrefs);
    println!("  Max depth: {}", config.crawler.max_depth);
    match config.crawler.max_branch_count {
        Some(max) => println!("  Max branch count: {}", max),
        None => println!("  Max branch count: unlimited"),
    }
    println!("  Timeout: {}s", config.crawler.timeout_secs);
    println!("  Valid extensions: {}", config.crawler.valid_extensions.join(", "));
    println!("  Accept invalid certs: {}", config.crawler.accept_invalid_certs);

    println!("\nCache:");
    if config.cache.enabled {
        println!("  Directory: {}", config.cache.directory);
        match config.cache.max_size_mb {
            Some(0) => println!("  Read-only"),
            Some(max) => println!("  Max size: {} MB", max),
            None => println!("  Max size: unlimited"),
        }
    } else {
        println!("  Disabled");
    }

    println!("\nSearch:");
    for name in &config.search.presets {
        println!("  - {} (preset)", name);
    }
    for (name, pattern) in &config.search.patterns {
        println!("  - {}: {}", name, pattern);
    }
    if !config.search.stop_on_found.is_empty() {
        println!("  Stop on: {}", config.search.stop_on_found.join(", "));
    }
    if !config.search.ranking.is_empty() {
        println!("  Ranking: {}", config.search.ranking.join(", "));
    }

    println!("\nSeeds ({}):", seeds.len());
    for seed in seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}
