//! Exact-text deduplication of filings.
//!
//! Filings are ordered by comment text and runs of byte-identical text are
//! collapsed into a single [`UniqueComment`] carrying the run length.

use crate::models::{FilingSet, UniqueComment};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Result of deduplicating a filing set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupeOutcome {
    /// Unique comments in ascending text order.
    pub uniques: Vec<UniqueComment>,
    /// Number of filings in the input.
    pub total_filings: usize,
    /// Filings that repeated an earlier text (`total_filings - uniques.len()`).
    pub duplicates_removed: usize,
}

/// Collapse filings with identical comment text.
///
/// Texts are compared byte for byte with no normalization, and the output is
/// sorted by `str` ordering. The empty comment is a key like any other.
pub fn dedupe(filings: &FilingSet) -> DedupeOutcome {
    let mut texts: Vec<&str> = filings.filings.iter().map(|f| f.comment.as_str()).collect();
    texts.sort();

    let mut uniques: Vec<UniqueComment> = Vec::new();
    let mut run: Option<UniqueComment> = None;

    for text in texts {
        if let Some(current) = run.as_mut() {
            if current.text == text {
                current.count += 1;
                continue;
            }
        }

        let next = UniqueComment {
            text: text.to_string(),
            count: 1,
        };
        if let Some(finished) = run.replace(next) {
            uniques.push(finished);
        }
    }

    // The last run never sees a text change.
    if let Some(finished) = run {
        uniques.push(finished);
    }

    let total_filings = filings.len();
    let duplicates_removed = total_filings - uniques.len();

    info!("Filtered down to a total of {} unique comments", uniques.len());
    info!("Removed {} duplicate filings", duplicates_removed);

    DedupeOutcome {
        uniques,
        total_filings,
        duplicates_removed,
    }
}

/// Rebuild a filing set holding one representative filing per unique comment.
#[cfg(test)]
pub fn to_filing_set(uniques: &[UniqueComment]) -> FilingSet {
    use crate::models::Filing;

    FilingSet::new(
        uniques
            .iter()
            .map(|u| Filing::with_comment(u.text.clone()))
            .collect(),
    )
}

/// The `n` most repeated comments, largest first.
///
/// Only texts submitted more than once qualify. Ties are ordered by text.
pub fn top_duplicates(uniques: &[UniqueComment], n: usize) -> Vec<UniqueComment> {
    let mut repeated: Vec<&UniqueComment> = uniques.iter().filter(|u| u.count > 1).collect();

    repeated.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.text.cmp(&b.text)));
    repeated.into_iter().take(n).cloned().collect()
}
