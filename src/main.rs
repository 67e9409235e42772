//! Tingli main entry point
//!
//! Command-line interface for the lesson-audio archive crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tingli::config::load_config_with_hash;
use tingli::crawler::run_crawl;
use tracing_subscriber::EnvFilter;

/// Tingli: a lesson-audio archive crawler
///
/// Walks a language-lesson site's paginated archive, downloads each
/// lesson's audio file into a local directory (skipping files already
/// present), and writes a JSON summary of every lesson processed.
#[derive(Parser, Debug)]
#[command(name = "tingli")]
#[command(version)]
#[command(about = "A lesson-audio archive crawler", long_about = None)]
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

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &config_hash);
        return Ok(());
    }

    // Per-lesson failures are recorded in the summary, not propagated, so a
    // completed crawl exits zero even when individual lessons failed. Only
    // setup errors reach this `?`.
    let run = run_crawl(config, &config_hash)
        .await
        .context("crawl aborted during setup")?;

    let totals = run.totals();
    println!(
        "✓ Crawl complete: {} downloaded, {} skipped, {} failed ({} lesson(s) total)",
        totals.downloaded,
        totals.skipped,
        totals.failed,
        run.lessons().len()
    );

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tingli=info,warn"),
            1 => EnvFilter::new("tingli=debug,info"),
            2 => EnvFilter::new("tingli=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the effective
/// settings
fn handle_dry_run(config: &tingli::config::Config, config_hash: &str) {
    println!("=== Tingli Dry Run ===\n");

    println!("Crawl:");
    println!("  Start URL: {}", config.crawl.start_url);
    println!(
        "  Delay between requests: {}ms",
        config.crawl.delay_between_requests_ms
    );

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Request timeout: {}s", config.http.request_timeout_secs);
    println!(
        "  Retries: {} (backoff base {}ms)",
        config.http.max_retries, config.http.retry_backoff_ms
    );

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Summary file: {}", config.output.summary_filename);

    println!("\n✓ Configuration is valid (hash: {})", config_hash);
}
