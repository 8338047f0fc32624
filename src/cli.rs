//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Options left unset fall back to the
//! configuration file, then to built-in defaults.

use clap::Parser;
use std::path::PathBuf;

/// commentsift - deduplicate docket comments and measure their sentiment
///
/// Downloads every public comment filed on a regulatory docket, collapses
/// identical submissions from mass-comment campaigns, and scores each
/// distinct comment once with a sentiment service.
///
/// Examples:
///   commentsift --docket 18-197
///   commentsift --docket 18-197 --cap 500 --output report.md
///   commentsift --dry-run --refresh
///   commentsift --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Docket (proceeding) identifier to collect filings for
    #[arg(short, long, value_name = "ID", env = "COMMENTSIFT_DOCKET")]
    pub docket: Option<String>,

    /// Filings requested per page
    #[arg(long, value_name = "COUNT")]
    pub page_size: Option<usize>,

    /// Maximum number of unique comments to send for sentiment analysis
    #[arg(long, value_name = "COUNT")]
    pub cap: Option<usize>,

    /// Pause between page requests in milliseconds (minimum 500)
    #[arg(long, value_name = "MS")]
    pub rate_limit_ms: Option<u64>,

    /// Snapshot file used to cache fetched filings
    #[arg(short, long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Ignore an existing snapshot and fetch again
    #[arg(long)]
    pub refresh: bool,

    /// Docket API root URL
    #[arg(long, value_name = "URL")]
    pub docket_url: Option<String>,

    /// Sentiment service instance URL
    #[arg(long, value_name = "URL", env = "NLU_URL")]
    pub nlu_url: Option<String>,

    /// Sentiment service API key
    #[arg(long, value_name = "KEY", env = "NLU_APIKEY", hide_env_values = true)]
    pub nlu_api_key: Option<String>,

    /// Request timeout in seconds for both services
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .commentsift.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write a full report to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report file format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Fetch or load and deduplicate only; no sentiment calls
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .commentsift.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.page_size == Some(0) {
            return Err("Page size must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if let Some(ref docket) = self.docket {
            if docket.trim().is_empty() {
                return Err("Docket id must not be empty".to_string());
            }
        }

        if let Some(ref output) = self.output {
            if output.is_dir() {
                return Err(format!("Output path is a directory: {}", output.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
