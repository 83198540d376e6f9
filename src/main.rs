//! rst-crawler main entry point
//!
//! This is the command-line interface for the resumable restaurant crawler.

use anyhow::{bail, Context};
use clap::Parser;
use rst_crawler::config::{load_config_with_hash, Config};
use rst_crawler::output::print_status;
use rst_crawler::{CrawlService, StartRequest, StartResponse};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// rst-crawler: a resumable restaurant listing crawler
///
/// Walks a paginated restaurant listing, records every detail page in a
/// durable ledger and scrapes up to a target number of records per run.
/// Interrupted runs resume where they stopped.
#[derive(Parser, Debug)]
#[command(name = "rst-crawler")]
#[command(version)]
#[command(about = "A resumable restaurant listing crawler", long_about = None)]
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

    /// Continue from the saved ledger
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Discard the saved ledger, status log and records before crawling
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Number of records to scrape in this run
    #[arg(long, value_name = "N")]
    target: Option<usize>,

    /// Listing URL to start discovery from
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Move failed URLs back to pending before crawling
    #[arg(long, conflicts_with = "fresh")]
    retry_failed: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "status")]
    dry_run: bool,

    /// Show progress from the saved ledger and status log and exit
    #[arg(long, conflicts_with = "dry_run")]
    status: bool,
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
        handle_dry_run(&config, &cli);
    } else if cli.status {
        print_status(&CrawlService::http(config).status());
    } else {
        handle_crawl(config, &cli).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rst_crawler=info,warn"),
            1 => EnvFilter::new("rst_crawler=debug,info"),
            2 => EnvFilter::new("rst_crawler=trace,debug"),
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

/// Builds the start request from the config defaults and CLI overrides
fn start_request(config: &Config, cli: &Cli) -> StartRequest {
    let mut request = StartRequest::from_config(&config.crawler);
    if let Some(base_url) = &cli.base_url {
        request.base_url = base_url.clone();
    }
    if let Some(target) = cli.target {
        request.target_count = target;
    }
    if cli.fresh {
        request.resume = false;
    } else if cli.resume {
        request.resume = true;
    }
    request.retry_failed = cli.retry_failed;
    request
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config, cli: &Cli) {
    let request = start_request(config, cli);

    println!("=== rst-crawler Dry Run ===\n");

    println!("Run:");
    println!("  Base URL: {}", request.base_url);
    println!("  Target count: {}", request.target_count);
    println!("  Mode: {}", if request.resume { "resume" } else { "fresh" });
    println!("  Retry failed: {}", request.retry_failed);
    if !config.crawler.extra_seeds.is_empty() {
        println!("  Extra seeds:");
        for seed in &config.crawler.extra_seeds {
            println!("    * {}", seed);
        }
    }

    println!("\nCrawler Configuration:");
    println!("  Discovery policy: {:?}", config.crawler.discovery_policy);
    if config.crawler.allowed_domains.is_empty() {
        println!("  Allowed domains: any");
    } else {
        println!(
            "  Allowed domains: {}",
            config.crawler.allowed_domains.join(", ")
        );
    }
    println!("  Page timeout: {}s", config.crawler.page_timeout_secs);
    println!("  Ready timeout: {}s", config.crawler.ready_timeout_secs);
    match config.crawler.run_timeout() {
        Some(limit) => println!("  Run timeout: {}s", limit.as_secs()),
        None => println!("  Run timeout: none"),
    }
    if config.crawler.max_listing_pages > 0 {
        println!("  Max listing pages: {}", config.crawler.max_listing_pages);
    }

    println!("\nRate Limiting:");
    println!(
        "  429 backoff: {}-{}ms, {} retries",
        config.rate_limit.min_wait_ms, config.rate_limit.max_wait_ms, config.rate_limit.max_retries
    );
    println!(
        "  Crawl retries: {} after {}ms",
        config.rate_limit.crawl_retries, config.rate_limit.crawl_retry_wait_ms
    );

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Ledger: {}", config.output.ledger_path().display());
    println!("  Status log: {}", config.output.log_path().display());
    println!("  Records: {}", config.output.records_path().display());

    if !config.selectors.is_empty() {
        println!("\nSelector Overrides ({}):", config.selectors.len());
        for (name, css) in &config.selectors {
            println!("  - {} = {}", name, css);
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, cli: &Cli) -> anyhow::Result<()> {
    let request = start_request(&config, cli);
    if request.resume {
        tracing::info!("Starting crawl (resuming from the saved ledger)");
    } else {
        tracing::info!("Starting fresh crawl (discarding previous state)");
    }

    let service = Arc::new(CrawlService::http(config));

    // First Ctrl+C stops after the current page, a second one quits at once.
    let stopper = Arc::clone(&service);
    tokio::spawn(async move {
        stopper
            .watch_interrupts(tokio::signal::ctrl_c, || std::process::exit(1))
            .await;
    });

    let response = service
        .start(request)
        .await
        .context("crawl run failed")?;

    match response {
        StartResponse::Accepted { summary, .. } => {
            if let Some(summary) = summary {
                tracing::info!(
                    "Crawl completed in {:.1}s: {} scraped, {} failed, {} still pending",
                    summary.elapsed.as_secs_f64(),
                    summary.fetch.scraped,
                    summary.fetch.failed,
                    summary.counts.pending
                );
            }
            Ok(())
        }
        StartResponse::Rejected { reason } => bail!("crawl not started: {}", reason),
    }
}
