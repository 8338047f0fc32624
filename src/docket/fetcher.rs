//! Paginated retrieval of docket filings.
//!
//! Pages are requested newest-first until the API returns an empty page,
//! pausing a fixed delay between requests so the public API is not hammered.

use super::FilingSource;
use crate::error::{PipelineError, Result};
use crate::models::{Filing, FilingSet};
use crate::shutdown::Shutdown;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Settings for the docket API client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// API root, e.g. `https://ecfsapi.fcc.gov`.
    pub base_url: String,
    /// Proceeding name to collect filings for.
    pub docket_id: String,
    /// Filings requested per page.
    pub page_size: usize,
    /// Pause between page requests.
    pub rate_limit_delay: Duration,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// Extra attempts for a page after a network failure.
    pub retries: usize,
    /// Optional API key sent as the `api_key` query parameter.
    pub api_key: Option<String>,
    /// Show a spinner while fetching.
    pub show_progress: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ecfsapi.fcc.gov".to_string(),
            docket_id: "18-197".to_string(),
            page_size: 250,
            rate_limit_delay: Duration::from_millis(500),
            timeout_seconds: 60,
            retries: 3,
            api_key: None,
            show_progress: true,
        }
    }
}

/// Client that pages through every filing of one docket.
pub struct DocketFetcher {
    config: FetchConfig,
    http_client: reqwest::Client,
}

impl DocketFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        info!(
            "Initializing docket client for proceeding {} at {}",
            config.docket_id, config.base_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(PipelineError::Client)?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Fetch every filing for the configured docket.
    pub async fn fetch(&self, shutdown: &Shutdown) -> Result<FilingSet> {
        let progress = self.spinner();
        let mut filings: Vec<Filing> = Vec::new();
        let mut offset = 0;

        loop {
            if shutdown.is_triggered() {
                if let Some(pb) = &progress {
                    pb.abandon_with_message("Fetch interrupted");
                }
                return Err(PipelineError::Cancelled("fetch"));
            }

            info!("Requesting filings at offset {}", offset);
            let page = self.fetch_page_with_retry(offset, shutdown).await?;
            info!("Got {} filings", page.len());

            if page.is_empty() {
                info!("Reached the end of the filings");
                break;
            }

            filings.extend(page);
            offset += self.config.page_size;

            if let Some(pb) = &progress {
                pb.set_message(format!("{} filings fetched", filings.len()));
            }

            // An interrupted pause is caught by the check at the top of the loop.
            shutdown.sleep(self.config.rate_limit_delay).await;
        }

        if let Some(pb) = progress {
            pb.finish_with_message(format!("Fetched {} filings", filings.len()));
        }
        info!("Total filings grabbed: {}", filings.len());

        Ok(FilingSet::new(filings))
    }

    /// Fetch one page, retrying network failures with exponential backoff.
    async fn fetch_page_with_retry(
        &self,
        offset: usize,
        shutdown: &Shutdown,
    ) -> Result<Vec<Filing>> {
        let mut delay = self.config.rate_limit_delay;
        let mut attempt = 0;

        loop {
            match self.fetch_page(offset).await {
                Err(e) if e.is_transient() && attempt < self.config.retries => {
                    attempt += 1;
                    warn!(
                        "{} (attempt {} of {}), retrying in {:?}",
                        e,
                        attempt,
                        self.config.retries + 1,
                        delay
                    );
                    if !shutdown.sleep(delay).await {
                        return Err(PipelineError::Cancelled("fetch"));
                    }
                    delay *= 2;
                }
                result => return result,
            }
        }
    }

    /// Request the page starting at `offset`.
    async fn fetch_page(&self, offset: usize) -> Result<Vec<Filing>> {
        let url = format!("{}/filings", self.config.base_url.trim_end_matches('/'));

        let mut query = vec![
            ("limit", self.config.page_size.to_string()),
            ("offset", offset.to_string()),
            ("proceedings.name", self.config.docket_id.clone()),
            ("sort", "date_disseminated,DESC".to_string()),
        ];
        if let Some(key) = &self.config.api_key {
            query.push(("api_key", key.clone()));
        }

        debug!("GET {} offset={}", url, offset);

        let network_error = |message: String| PipelineError::Network { offset, message };

        let response = self
            .http_client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    network_error(format!(
                        "request timed out after {}s",
                        self.config.timeout_seconds
                    ))
                } else if e.is_connect() {
                    network_error(format!("cannot connect to {}", self.config.base_url))
                } else {
                    network_error(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(network_error(format!("docket API error {}: {}", status, body)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| network_error(format!("failed to read body: {}", e)))?;

        let page: FilingSet =
            serde_json::from_slice(&body).map_err(|source| PipelineError::Parse {
                origin: format!("docket page at offset {}", offset),
                source,
            })?;

        Ok(page.filings)
    }

    fn spinner(&self) -> Option<ProgressBar> {
        if !self.config.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message(format!("Fetching docket {}", self.config.docket_id));
        Some(pb)
    }
}

#[async_trait]
impl FilingSource for DocketFetcher {
    async fn fetch_all(&self, shutdown: &Shutdown) -> Result<FilingSet> {
        self.fetch(shutdown).await
    }
}
