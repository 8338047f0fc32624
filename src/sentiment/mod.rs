//! Sentiment scoring services.
//!
//! The aggregator only sees the [`SentimentService`] capability; the HTTP
//! provider lives in [`client`].

pub mod client;

pub use client::{NluClient, NluConfig};

use crate::error::AnalysisError;
use crate::shutdown::Shutdown;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Scores a text on a scale from -1 (negative) to 1 (positive).
#[async_trait]
pub trait SentimentService: Send + Sync {
    /// Human-readable provider name, used in logs.
    fn name(&self) -> &str;

    /// Score one comment.
    async fn analyze(&self, text: &str) -> Result<f64, AnalysisError>;
}

/// Wraps a service with bounded retries and exponential backoff.
///
/// A Ctrl-C during a backoff pause gives up on the comment with the last error.
pub struct Retrying<S> {
    inner: S,
    retries: usize,
    backoff: Duration,
    shutdown: Shutdown,
}

impl<S: SentimentService> Retrying<S> {
    pub fn new(inner: S, retries: usize, backoff: Duration, shutdown: Shutdown) -> Self {
        Self {
            inner,
            retries,
            backoff,
            shutdown,
        }
    }
}

#[async_trait]
impl<S: SentimentService> SentimentService for Retrying<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn analyze(&self, text: &str) -> Result<f64, AnalysisError> {
        let mut delay = self.backoff;
        let mut attempt = 0;

        loop {
            match self.inner.analyze(text).await {
                Ok(score) => return Ok(score),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    debug!(
                        "Sentiment attempt {} of {} failed: {}",
                        attempt,
                        self.retries + 1,
                        e
                    );
                    if !self.shutdown.sleep(delay).await {
                        return Err(e);
                    }
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
