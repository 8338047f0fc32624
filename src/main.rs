//! commentsift - regulatory docket comment deduplication and sentiment
//!
//! A CLI tool that downloads the public comments filed on a docket,
//! collapses identical submissions, and measures the sentiment of each
//! distinct comment with a natural language understanding service.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Fatal error (network, parse, snapshot I/O, configuration, interrupt)

mod analysis;
mod cli;
mod config;
mod docket;
mod error;
mod models;
mod report;
mod sentiment;
mod shutdown;
mod snapshot;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::Config;
use error::PipelineError;
use models::RunSummary;
use sentiment::{NluClient, Retrying};
use shutdown::Shutdown;
use snapshot::SnapshotStore;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Initial backoff between sentiment retries.
const SENTIMENT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("commentsift v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .commentsift.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Set [sentiment].endpoint_url and api_key (or NLU_URL / NLU_APIKEY).");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the fetch, dedupe, analyze and report pipeline.
async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate(!args.dry_run)?;

    let shutdown = Shutdown::on_ctrl_c();
    let show_progress = !args.quiet;

    // Step 1: Load the snapshot or fetch from the docket API
    println!("📥 Loading filings for docket {}", config.docket.id);
    let store = SnapshotStore::new(&config.snapshot.path);
    let fetch_config = config.fetch_config(show_progress);
    let (filings, source) = docket::load_or_fetch(
        &store,
        || docket::DocketFetcher::new(fetch_config),
        args.refresh,
        &shutdown,
    )
    .await?;

    if filings.is_empty() {
        warn!("Docket {} has no filings", config.docket.id);
    }

    // Step 2: Collapse duplicate submissions
    println!("\n🧹 Deduplicating {} filings...", filings.len());
    let outcome = analysis::dedupe(&filings);
    let top_campaigns = analysis::top_duplicates(&outcome.uniques, config.report.top_campaigns);

    // Step 3: Score each unique comment
    let sentiment = if args.dry_run {
        info!("Dry run: skipping sentiment analysis");
        None
    } else {
        println!("\n🔬 Running sentiment analysis...");
        println!("   Endpoint: {}", config.sentiment.endpoint_url);
        println!("   Cap: {} unique comments", config.sentiment.analysis_cap);

        let client = NluClient::new(config.nlu_config())?;
        let service = Retrying::new(
            client,
            config.sentiment.retries,
            SENTIMENT_RETRY_BACKOFF,
            shutdown.clone(),
        );

        Some(
            analysis::analyze(
                &outcome.uniques,
                config.sentiment.analysis_cap,
                &service,
                &shutdown,
                show_progress,
            )
            .await,
        )
    };

    // Step 4: Report
    let summary = RunSummary {
        docket_id: config.docket.id.clone(),
        generated_at: Utc::now(),
        source,
        total_filings: outcome.total_filings,
        unique_comments: outcome.uniques.len(),
        duplicates_removed: outcome.duplicates_removed,
        top_campaigns,
        analysis_cap: config.sentiment.analysis_cap,
        sentiment,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    println!("\n📊 Summary:");
    println!("{}", report::dedupe_summary(&summary));
    if let Some(ref sentiment) = summary.sentiment {
        println!("\n{}", report::sentiment_summary(sentiment));
    }

    if let Some(ref output) = args.output {
        report::write_report(&summary, args.format, output)?;
        println!("\n✅ Report saved to: {}", output.display());
    }

    if summary.sentiment.as_ref().is_some_and(|s| s.interrupted) {
        warn!("Results above are partial");
        return Err(PipelineError::Cancelled("analysis").into());
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
