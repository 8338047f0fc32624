//! HTTP client for a Natural Language Understanding sentiment endpoint.
//!
//! Sends `POST {endpoint}/v1/analyze?version=<api_version>` with the
//! sentiment feature enabled and reads the document-level score.

use super::SentimentService;
use crate::error::AnalysisError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Connection settings for the sentiment service.
#[derive(Debug, Clone)]
pub struct NluConfig {
    pub endpoint_url: String,
    pub api_key: String,
    pub api_version: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
    features: Features,
}

#[derive(Debug, Serialize)]
struct Features {
    sentiment: SentimentOptions,
}

#[derive(Debug, Serialize)]
struct SentimentOptions {}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    sentiment: Option<SentimentResult>,
}

#[derive(Debug, Deserialize)]
struct SentimentResult {
    #[serde(default)]
    document: Option<DocumentSentiment>,
}

#[derive(Debug, Deserialize)]
struct DocumentSentiment {
    #[serde(default)]
    score: Option<f64>,
}

/// Sentiment provider backed by the NLU REST API.
pub struct NluClient {
    config: NluConfig,
    http_client: reqwest::Client,
}

impl NluClient {
    pub fn new(config: NluConfig) -> Result<Self> {
        info!(
            "Initializing sentiment client for {} (version {})",
            config.endpoint_url, config.api_version
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn analyze_url(&self) -> String {
        format!("{}/v1/analyze", self.config.endpoint_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SentimentService for NluClient {
    fn name(&self) -> &str {
        "natural-language-understanding"
    }

    async fn analyze(&self, text: &str) -> Result<f64, AnalysisError> {
        let request = AnalyzeRequest {
            text,
            features: Features {
                sentiment: SentimentOptions {},
            },
        };

        let response = self
            .http_client
            .post(self.analyze_url())
            .query(&[("version", self.config.api_version.as_str())])
            .basic_auth("apikey", Some(&self.config.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Request(format!(
                        "timed out after {}s",
                        self.config.timeout_seconds
                    ))
                } else if e.is_connect() {
                    AnalysisError::Request(format!(
                        "cannot connect to {}",
                        self.config.endpoint_url
                    ))
                } else {
                    AnalysisError::Request(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Status { status, body });
        }

        let parsed: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Malformed(e.to_string()))?;

        let score = parsed
            .sentiment
            .and_then(|s| s.document)
            .and_then(|d| d.score)
            .ok_or_else(|| AnalysisError::Malformed("missing sentiment.document.score".into()))?;

        if !(-1.0..=1.0).contains(&score) {
            return Err(AnalysisError::OutOfRange(score));
        }

        debug!("Scored {} chars at {:.3}", text.len(), score);
        Ok(score)
    }
}
