//! Job-Scout main entry point
//!
//! This is the command-line interface for the Job-Scout career-site watcher.

use anyhow::{Context, Result};
use clap::Parser;
use job_scout::config::{
    load_criteria, load_criteria_or_empty, load_settings_with_hash, load_sources,
    load_sources_or_empty, CriteriaSet, RuleSet, Settings,
};
use job_scout::crawler::{Delivery, Pipeline, RunSummary};
use job_scout::events::{EventSink, TracingSink};
use job_scout::output::{load_statistics, print_statistics, OutboxNotifier};
use job_scout::storage::open_history;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Job-Scout: a rule-driven career-site watcher
///
/// Job-Scout crawls the configured career sites, scores every posting
/// against the search criteria, and writes a digest of new matches to the
/// outbox.
#[derive(Parser, Debug)]
#[command(name = "job-scout")]
#[command(version)]
#[command(about = "A rule-driven career-site watcher", long_about = None)]
struct Cli {
    /// Path to TOML settings file
    #[arg(value_name = "CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate configuration and list sources and criteria without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the history database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "no_history"])]
    stats: bool,

    /// Neither skip previously reported jobs nor record this run
    #[arg(long)]
    no_history: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (settings, config_hash) = load_settings_with_hash(&cli.config)
        .with_context(|| format!("failed to load settings from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&settings)
    } else if cli.stats {
        handle_stats(&settings)
    } else {
        handle_run(&settings, &config_hash, cli.no_history).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("job_scout=info,warn"),
            1 => EnvFilter::new("job_scout=debug,info"),
            2 => EnvFilter::new("job_scout=trace,debug"),
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

/// Handles the --dry-run mode: strict loading, no network
fn handle_dry_run(settings: &Settings) -> Result<()> {
    let sources = load_sources(Path::new(&settings.sources_path), &TracingSink)
        .with_context(|| format!("failed to load sources from {}", settings.sources_path))?;
    let criteria = load_criteria(Path::new(&settings.criteria_path))
        .with_context(|| format!("failed to load criteria from {}", settings.criteria_path))?;

    println!("=== Job-Scout Dry Run ===\n");

    println!("Fetch:");
    println!("  Attempts per page: {}", settings.fetch.max_retries);
    println!("  Base delay: {}ms", settings.fetch.base_delay_ms);
    println!("  Timeout: {}s", settings.fetch.timeout_secs);
    println!("  User agent: {}", settings.fetch.user_agent);

    println!("\nOutput:");
    println!("  Database: {}", settings.storage.database_path);
    println!("  Outbox: {}", settings.notify.outbox_dir);
    println!("  Summary: {}", settings.notify.summary_path);
    println!("  Recipients: {}", settings.notify.recipients.len());

    print_sources(&sources);
    print_criteria(&criteria);

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} sources", sources.len());

    Ok(())
}

fn print_sources(sources: &[RuleSet]) {
    println!("\nSources ({}):", sources.len());
    for rules in sources {
        match &rules.pagination {
            Some(pagination) => println!(
                "  - {} ({}, up to {} pages via ?{}=)",
                rules.name, pagination.base_url, pagination.max_pages, pagination.param_name
            ),
            None => println!("  - {} ({}, single page)", rules.name, rules.career_url),
        }
    }
}

fn print_criteria(criteria: &CriteriaSet) {
    let join = |terms: &std::collections::BTreeSet<String>| {
        terms.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    };

    println!("\nCriteria (threshold {:.2}):", criteria.threshold);
    println!("  Primary keywords: {}", join(&criteria.primary_keywords));
    println!("  Related terms: {}", join(&criteria.related_terms));
    println!("  Locations: {}", join(&criteria.locations));
    println!("  Excluded terms: {}", join(&criteria.exclude_terms));
}

/// Handles the --stats mode: shows statistics from the history database
fn handle_stats(settings: &Settings) -> Result<()> {
    println!("Database: {}\n", settings.storage.database_path);

    let history = open_history(Path::new(&settings.storage.database_path))
        .context("failed to open history database")?;
    let report = load_statistics(&history)?;
    print_statistics(&report);

    Ok(())
}

/// Handles a full run: crawl, rank, notify, record
async fn handle_run(settings: &Settings, config_hash: &str, no_history: bool) -> Result<()> {
    let sink: Arc<dyn EventSink> = Arc::new(TracingSink);

    let sources = load_sources_or_empty(Path::new(&settings.sources_path), sink.as_ref());
    let criteria = load_criteria_or_empty(Path::new(&settings.criteria_path), sink.as_ref());
    tracing::info!(
        "Sources: {}, primary keywords: {}, threshold: {:.2}",
        sources.len(),
        criteria.primary_keywords.len(),
        criteria.threshold
    );

    let notifier = OutboxNotifier::new(&settings.notify);
    let mut history = if no_history {
        tracing::info!("History disabled for this run");
        None
    } else {
        Some(
            open_history(Path::new(&settings.storage.database_path))
                .context("failed to open history database")?,
        )
    };

    let mut pipeline = Pipeline::new(&criteria, &notifier, sink).send_empty(settings.notify.send_empty);
    if let Some(store) = history.as_mut() {
        pipeline = pipeline.with_history(store);
    }

    let summary = pipeline
        .run(&sources, &settings.fetch, config_hash)
        .await
        .context("run failed")?;
    report_run(&summary);

    if summary.delivery == Delivery::Failed {
        anyhow::bail!("notification failed; matches will be retried on the next run");
    }

    Ok(())
}

fn report_run(summary: &RunSummary) {
    for source in &summary.sources {
        tracing::info!(
            "{}: {} ({} pages, {} jobs)",
            source.source,
            source.state,
            source.pages,
            source.records
        );
    }

    tracing::info!(
        "Found {} jobs ({} new), {} matching",
        summary.jobs_found,
        summary.new_jobs,
        summary.matches.len()
    );

    for scored in &summary.matches {
        tracing::info!(
            "  {:.2}  {} at {} ({})",
            scored.score,
            scored.record.title,
            scored.record.source,
            scored.record.location
        );
    }
}
