//! Error types for the ingestion and analysis pipeline.
//!
//! Fatal failures surface as [`PipelineError`] and abort the run. A failed
//! sentiment call is an [`AnalysisError`], which only drops that one comment.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised while fetching, loading or persisting filings.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A docket page request failed (transport error or non-success status).
    #[error("Failed to fetch page at offset {offset}: {message}")]
    Network { offset: usize, message: String },

    /// A docket page or snapshot body did not match the filing schema.
    #[error("Failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot file could not be read or written.
    #[error("Snapshot I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client for the docket API could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The run was interrupted before the current stage finished.
    #[error("Interrupted during {0}")]
    Cancelled(&'static str),
}

impl PipelineError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PipelineError::Network { .. })
    }
}

/// A single comment could not be scored by the sentiment service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("score {0} is outside [-1, 1]")]
    OutOfRange(f64),
}

/// Convenience alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
