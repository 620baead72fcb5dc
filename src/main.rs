//! Rockpool main entry point
//!
//! Command-line interface for running a bounded single-domain crawl.

use anyhow::Context;
use clap::Parser;
use rockpool::config::load_config_with_hash;
use rockpool::crawler::{crawl, CrawlReport, Termination};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Rockpool: a bounded single-domain crawler
///
/// Rockpool crawls one web domain breadth-first, bounded by depth and page
/// count, while respecting robots.txt and per-host politeness delays. The
/// collected pages are written as newline-delimited JSON for a downstream
/// extraction pipeline.
#[derive(Parser, Debug)]
#[command(name = "rockpool")]
#[command(version = "1.0.0")]
#[command(about = "A bounded single-domain crawler", long_about = None)]
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

    /// Validate config and show what would be crawled without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let report = crawl(config).await.context("crawl failed")?;
    print_report(&report);

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rockpool=info,warn"),
            1 => EnvFilter::new("rockpool=debug,info"),
            2 => EnvFilter::new("rockpool=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &rockpool::config::Config) {
    println!("=== Rockpool Dry Run ===\n");

    println!("Crawl:");
    println!("  Root URL: {}", config.crawl.root_url);
    println!("  Max pages: {}", config.crawl.max_pages);
    println!("  Max depth: {}", config.crawl.max_depth);
    println!("  Include subdomains: {}", config.crawl.include_subdomains);
    if config.crawl.keywords.is_empty() {
        println!("  Keywords: (none)");
    } else {
        println!("  Keywords: {}", config.crawl.keywords.join(", "));
    }

    println!("\nFetch:");
    println!("  Request timeout: {}ms", config.fetch.request_timeout_ms);
    println!("  Politeness delay: {}ms", config.fetch.politeness_delay_ms);
    println!("  Max retries: {}", config.fetch.max_retries);
    println!("  Body byte cap: {}", config.fetch.max_body_bytes);
    println!("  Ignore robots.txt: {}", config.fetch.ignore_robots);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Pages: {}", config.output.pages_path);
    match &config.output.database_path {
        Some(path) => println!("  Database: {}", path),
        None => println!("  Database: (disabled)"),
    }

    println!("\n✓ Configuration is valid");
}

/// Prints the end-of-crawl summary
fn print_report(report: &CrawlReport) {
    let termination = match report.termination {
        Termination::FrontierExhausted => "frontier exhausted",
        Termination::PageBudgetReached => "page budget reached",
        Termination::Cancelled => "cancelled",
    };

    println!("Crawl finished ({}) in {:.1?}", termination, report.elapsed);
    println!("  Pages stored:      {}", report.pages_stored);
    println!("  Failed URLs:       {}", report.failed);
    println!("  Robots skipped:    {}", report.robots_skipped);
    println!("  Blocked responses: {}", report.blocked);
    println!("  Redirects:         {}", report.redirects_followed);
    println!("  Beyond depth:      {}", report.beyond_depth);
    println!("  Discarded queue:   {}", report.frontier_discarded);
    println!("  URLs seen:         {}", report.urls_seen);
}
