//! Data models for docket filings and sentiment results.
//!
//! This module contains the core data structures passed between the
//! fetcher, the deduplicator, the aggregator and the report emitter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A single public comment filed on a docket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filing {
    /// Confirmation number assigned by the docket system.
    #[serde(rename = "confirmation_number", default, deserialize_with = "null_as_empty")]
    pub number: String,
    /// Contact email supplied by the filer.
    #[serde(rename = "contact_email", default, deserialize_with = "null_as_empty")]
    pub email: String,
    /// Free-form comment text. May be empty.
    #[serde(rename = "text_data", default, deserialize_with = "null_as_empty")]
    pub comment: String,
}

impl Filing {
    /// Creates a filing carrying only a comment.
    #[cfg(test)]
    pub fn with_comment(comment: impl Into<String>) -> Self {
        Self {
            number: String::new(),
            email: String::new(),
            comment: comment.into(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Ordered collection of filings, serialized as the docket API envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingSet {
    #[serde(rename = "filings", default)]
    pub filings: Vec<Filing>,
}

impl FilingSet {
    pub fn new(filings: Vec<Filing>) -> Self {
        Self { filings }
    }

    pub fn len(&self) -> usize {
        self.filings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filings.is_empty()
    }
}

/// A distinct comment text and how many filings submitted it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueComment {
    pub text: String,
    pub count: usize,
}

/// Direction of a sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    InFavor,
    InOpposition,
}

impl Polarity {
    /// Classifies a score. Only strictly positive scores count as in favor.
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            Polarity::InFavor
        } else {
            Polarity::InOpposition
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::InFavor => write!(f, "in favor"),
            Polarity::InOpposition => write!(f, "in opposition"),
        }
    }
}

/// Aggregate sentiment over the analyzed unique comments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Unique comments that were scored successfully.
    pub processed: usize,
    /// Mean score over `processed` items. `None` when nothing was scored.
    pub average_sentiment: Option<f64>,
    /// Scores strictly above zero.
    pub in_favor: usize,
    /// Scores at or below zero.
    pub in_opposition: usize,
    /// Unique entries with empty text, skipped without a service call.
    pub empty_comments_skipped: usize,
    /// Items whose sentiment call failed.
    pub failed: usize,
    /// Items taken from the input under the analysis cap.
    pub examined: usize,
    /// Analysis stopped on Ctrl-C before every capped item was examined.
    #[serde(default)]
    pub interrupted: bool,
}

impl AggregateReport {
    /// Overall direction, if any comment was scored.
    pub fn polarity(&self) -> Option<Polarity> {
        self.average_sentiment.map(Polarity::from_score)
    }
}

/// Where the filings for a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Snapshot,
    Remote,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Snapshot => write!(f, "local snapshot"),
            DataSource::Remote => write!(f, "docket API"),
        }
    }
}

/// Everything the report emitter needs about one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Docket (proceeding) identifier.
    pub docket_id: String,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Where the filings were read from.
    pub source: DataSource,
    /// Filings before deduplication.
    pub total_filings: usize,
    /// Distinct comment texts.
    pub unique_comments: usize,
    /// Filings collapsed into an existing unique comment.
    pub duplicates_removed: usize,
    /// Most repeated texts, largest first.
    pub top_campaigns: Vec<UniqueComment>,
    /// Maximum unique comments sent for analysis.
    pub analysis_cap: usize,
    /// Sentiment results. `None` for dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<AggregateReport>,
    /// Wall-clock duration of the run in seconds.
    pub duration_seconds: f64,
}
