//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.commentsift.toml` files.

use crate::docket::FetchConfig;
use crate::sentiment::NluConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".commentsift.toml";

/// Smallest pause allowed between docket page requests.
pub const MIN_RATE_LIMIT_DELAY_MS: u64 = 500;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Docket API settings.
    #[serde(default)]
    pub docket: DocketConfig,

    /// Snapshot cache settings.
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Sentiment service settings.
    #[serde(default)]
    pub sentiment: SentimentConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Docket API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocketConfig {
    /// Proceeding name, e.g. `18-197`.
    #[serde(default = "default_docket_id")]
    pub id: String,

    /// Docket API root URL.
    #[serde(default = "default_docket_url")]
    pub base_url: String,

    /// Filings requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Pause between page requests in milliseconds.
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,

    /// Request timeout in seconds.
    #[serde(default = "default_docket_timeout")]
    pub timeout_seconds: u64,

    /// Number of retries on network failure.
    #[serde(default = "default_retries")]
    pub retries: usize,

    /// Optional docket API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for DocketConfig {
    fn default() -> Self {
        Self {
            id: default_docket_id(),
            base_url: default_docket_url(),
            page_size: default_page_size(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            timeout_seconds: default_docket_timeout(),
            retries: default_retries(),
            api_key: None,
        }
    }
}

fn default_docket_id() -> String {
    "18-197".to_string()
}

fn default_docket_url() -> String {
    "https://ecfsapi.fcc.gov".to_string()
}

fn default_page_size() -> usize {
    250
}

fn default_rate_limit_delay_ms() -> u64 {
    MIN_RATE_LIMIT_DELAY_MS
}

fn default_docket_timeout() -> u64 {
    60
}

fn default_retries() -> usize {
    3
}

/// Snapshot cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Location of the snapshot file.
    #[serde(default = "default_snapshot_path")]
    pub path: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
        }
    }
}

fn default_snapshot_path() -> String {
    crate::snapshot::DEFAULT_SNAPSHOT_PATH.to_string()
}

/// Sentiment service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    /// Service instance URL.
    #[serde(default)]
    pub endpoint_url: String,

    /// Service API key.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    /// API version date passed with every request.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Maximum unique comments to analyze per run.
    #[serde(default = "default_analysis_cap")]
    pub analysis_cap: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_sentiment_timeout")]
    pub timeout_seconds: u64,

    /// Retries per comment after a failed call.
    #[serde(default)]
    pub retries: usize,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            api_key: String::new(),
            api_version: default_api_version(),
            analysis_cap: default_analysis_cap(),
            timeout_seconds: default_sentiment_timeout(),
            retries: 0,
        }
    }
}

fn default_api_version() -> String {
    "2017-02-27".to_string()
}

fn default_analysis_cap() -> usize {
    10_000
}

fn default_sentiment_timeout() -> u64 {
    30
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Number of largest duplicate campaigns to list.
    #[serde(default = "default_top_campaigns")]
    pub top_campaigns: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_campaigns: default_top_campaigns(),
        }
    }
}

fn default_top_campaigns() -> usize {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only values the user actually supplied are applied.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref id) = args.docket {
            self.docket.id = id.clone();
        }
        if let Some(ref url) = args.docket_url {
            self.docket.base_url = url.clone();
        }
        if let Some(page_size) = args.page_size {
            self.docket.page_size = page_size;
        }
        if let Some(delay) = args.rate_limit_ms {
            self.docket.rate_limit_delay_ms = delay;
        }
        if let Some(timeout) = args.timeout {
            self.docket.timeout_seconds = timeout;
            self.sentiment.timeout_seconds = timeout;
        }

        if let Some(ref path) = args.snapshot {
            self.snapshot.path = path.display().to_string();
        }

        if let Some(ref url) = args.nlu_url {
            self.sentiment.endpoint_url = url.clone();
        }
        if let Some(ref key) = args.nlu_api_key {
            self.sentiment.api_key = key.clone();
        }
        if let Some(cap) = args.cap {
            self.sentiment.analysis_cap = cap;
        }
    }

    /// Check values that would make a run misbehave.
    pub fn validate(&self, needs_sentiment: bool) -> Result<()> {
        if self.docket.id.trim().is_empty() {
            bail!("Docket id must not be empty");
        }
        if self.docket.page_size == 0 {
            bail!("Page size must be at least 1");
        }
        if self.docket.rate_limit_delay_ms < MIN_RATE_LIMIT_DELAY_MS {
            bail!(
                "Rate limit delay must be at least {}ms to respect the docket API",
                MIN_RATE_LIMIT_DELAY_MS
            );
        }
        if !is_http_url(&self.docket.base_url) {
            bail!("Docket URL must start with 'http://' or 'https://'");
        }

        if needs_sentiment {
            if !is_http_url(&self.sentiment.endpoint_url) {
                bail!("Sentiment endpoint URL must be set and start with 'http://' or 'https://'");
            }
            if self.sentiment.api_key.is_empty() {
                bail!("Sentiment API key is required (set NLU_APIKEY or [sentiment].api_key)");
            }
        }

        Ok(())
    }

    /// Settings for the docket fetcher.
    pub fn fetch_config(&self, show_progress: bool) -> FetchConfig {
        FetchConfig {
            base_url: self.docket.base_url.clone(),
            docket_id: self.docket.id.clone(),
            page_size: self.docket.page_size,
            rate_limit_delay: Duration::from_millis(self.docket.rate_limit_delay_ms),
            timeout_seconds: self.docket.timeout_seconds,
            retries: self.docket.retries,
            api_key: self.docket.api_key.clone(),
            show_progress,
        }
    }

    /// Settings for the sentiment client.
    pub fn nlu_config(&self) -> NluConfig {
        NluConfig {
            endpoint_url: self.sentiment.endpoint_url.clone(),
            api_key: self.sentiment.api_key.clone(),
            api_version: self.sentiment.api_version.clone(),
            timeout_seconds: self.sentiment.timeout_seconds,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        let mut config = Config::default();
        config.sentiment.endpoint_url = "https://nlu.example.com".to_string();
        config.sentiment.api_key = "key".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.docket.id, "18-197");
        assert_eq!(config.docket.page_size, 250);
        assert_eq!(config.docket.rate_limit_delay_ms, 500);
        assert_eq!(config.sentiment.analysis_cap, 10_000);
        assert_eq!(config.snapshot.path, "fetched.json");
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[docket]
id = "17-108"
page_size = 100
rate_limit_delay_ms = 1000

[snapshot]
path = "cache/17-108.json"

[sentiment]
endpoint_url = "https://nlu.example.com"
analysis_cap = 50
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.docket.id, "17-108");
        assert_eq!(config.docket.page_size, 100);
        assert_eq!(config.docket.rate_limit_delay_ms, 1000);
        assert_eq!(config.docket.retries, 3);
        assert_eq!(config.snapshot.path, "cache/17-108.json");
        assert_eq!(config.sentiment.analysis_cap, 50);
        assert_eq!(config.sentiment.api_version, "2017-02-27");
        assert_eq!(config.report.top_campaigns, 10);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[docket]"));
        assert!(toml_str.contains("[snapshot]"));
        assert!(toml_str.contains("[sentiment]"));
        assert!(!toml_str.contains("api_key"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.docket.page_size, 250);
    }

    #[test]
    fn test_validate_rate_limit_floor() {
        let mut config = configured();
        assert!(config.validate(true).is_ok());

        config.docket.rate_limit_delay_ms = 100;
        assert!(config.validate(true).is_err());
    }

    #[test]
    fn test_cli_rate_limit_below_floor_is_rejected() {
        use clap::Parser;

        let args =
            crate::cli::Args::try_parse_from(["commentsift", "--rate-limit-ms", "100"]).unwrap();
        let mut config = configured();
        config.merge_with_args(&args);

        assert_eq!(config.docket.rate_limit_delay_ms, 100);
        assert!(config.validate(true).is_err());
        assert!(config.validate(false).is_err());
    }

    #[test]
    fn test_validate_sentiment_only_when_needed() {
        let config = Config::default();
        assert!(config.validate(false).is_ok());
        assert!(config.validate(true).is_err());
    }

    #[test]
    fn test_validate_page_size() {
        let mut config = configured();
        config.docket.page_size = 0;
        assert!(config.validate(true).is_err());
    }

    #[test]
    fn test_fetch_config_conversion() {
        let mut config = configured();
        config.docket.rate_limit_delay_ms = 750;

        let fetch = config.fetch_config(false);
        assert_eq!(fetch.rate_limit_delay, Duration::from_millis(750));
        assert_eq!(fetch.page_size, 250);
        assert!(!fetch.show_progress);

        let nlu = config.nlu_config();
        assert_eq!(nlu.endpoint_url, "https://nlu.example.com");
        assert_eq!(nlu.api_key, "key");
    }
}
