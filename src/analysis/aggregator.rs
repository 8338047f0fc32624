//! Sentiment aggregation over unique comments.
//!
//! Every distinct comment text is scored once, so a text submitted ten
//! thousand times weighs the same as one submitted once.

use crate::models::{AggregateReport, Polarity, UniqueComment};
use crate::sentiment::SentimentService;
use crate::shutdown::Shutdown;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

/// Longest comment excerpt written to the log for a failed item.
const LOG_PREVIEW_CHARS: usize = 120;

/// Running totals for one aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct SentimentTally {
    processed: usize,
    sentiment_total: f64,
    in_favor: usize,
    in_opposition: usize,
    empty_comments_skipped: usize,
    failed: usize,
    examined: usize,
    interrupted: bool,
}

impl SentimentTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a scored comment.
    pub fn record_score(&mut self, score: f64) {
        self.examined += 1;
        self.processed += 1;
        self.sentiment_total += score;

        match Polarity::from_score(score) {
            Polarity::InFavor => self.in_favor += 1,
            Polarity::InOpposition => self.in_opposition += 1,
        }
    }

    /// Count a unique entry with no text.
    pub fn record_empty(&mut self) {
        self.examined += 1;
        self.empty_comments_skipped += 1;
    }

    /// Count a comment the service could not score.
    pub fn record_failure(&mut self) {
        self.examined += 1;
        self.failed += 1;
    }

    /// Mark the pass as stopped early.
    pub fn record_interrupt(&mut self) {
        self.interrupted = true;
    }

    pub fn finish(self) -> AggregateReport {
        let average_sentiment = if self.processed == 0 {
            None
        } else {
            Some(self.sentiment_total / self.processed as f64)
        };

        AggregateReport {
            processed: self.processed,
            average_sentiment,
            in_favor: self.in_favor,
            in_opposition: self.in_opposition,
            empty_comments_skipped: self.empty_comments_skipped,
            failed: self.failed,
            examined: self.examined,
            interrupted: self.interrupted,
        }
    }
}

/// Score up to `cap` unique comments, in order, and aggregate the results.
///
/// Empty comments are counted and skipped. A failed service call is logged
/// and skipped without affecting other items. Items past the cap are never
/// sent to the service.
pub async fn analyze(
    uniques: &[UniqueComment],
    cap: usize,
    service: &dyn SentimentService,
    shutdown: &Shutdown,
    show_progress: bool,
) -> AggregateReport {
    let batch = &uniques[..cap.min(uniques.len())];
    if batch.len() < uniques.len() {
        info!(
            "Analysis cap {} reached; {} unique comments will not be analyzed",
            cap,
            uniques.len() - batch.len()
        );
    }

    info!(
        "Analyzing {} unique comments with {}",
        batch.len(),
        service.name()
    );

    let progress = progress_bar(batch.len(), show_progress);
    let mut tally = SentimentTally::new();

    for (index, entry) in batch.iter().enumerate() {
        if shutdown.is_triggered() {
            warn!(
                "Analysis interrupted after {} of {} comments",
                index,
                batch.len()
            );
            tally.record_interrupt();
            break;
        }

        debug!("Analyzing {}", index);

        if entry.text.is_empty() {
            tally.record_empty();
        } else {
            match service.analyze(&entry.text).await {
                Ok(score) => tally.record_score(score),
                Err(e) => {
                    warn!("Couldn't process \"{}\": {}", preview(&entry.text), e);
                    tally.record_failure();
                }
            }
        }

        progress.inc(1);
    }

    progress.finish_and_clear();

    let report = tally.finish();
    info!(
        "Analysis complete: {} scored, {} failed, {} empty",
        report.processed, report.failed, report.empty_comments_skipped
    );
    report
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// First few characters of a comment, for log lines.
fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(LOG_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Returns canned scores and remembers every text it was asked about.
    struct ScriptedService {
        scores: HashMap<String, Result<f64, AnalysisError>>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedService {
        fn new(scores: &[(&str, Result<f64, AnalysisError>)]) -> Self {
            Self {
                scores: scores
                    .iter()
                    .map(|(t, r)| (t.to_string(), r.clone()))
                    .collect(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SentimentService for ScriptedService {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn analyze(&self, text: &str) -> Result<f64, AnalysisError> {
            self.seen.lock().unwrap().push(text.to_string());
            self.scores
                .get(text)
                .cloned()
                .unwrap_or_else(|| Err(AnalysisError::Request("unscripted".to_string())))
        }
    }

    fn unique(text: &str, count: usize) -> UniqueComment {
        UniqueComment {
            text: text.to_string(),
            count,
        }
    }

    #[tokio::test]
    async fn test_scores_and_zero_boundary() {
        let service = ScriptedService::new(&[("a", Ok(0.5)), ("b", Ok(-0.3)), ("c", Ok(0.0))]);
        let uniques = vec![unique("a", 1), unique("b", 4), unique("c", 1)];

        let report = analyze(&uniques, 100, &service, &Shutdown::never(), false).await;

        assert_eq!(report.processed, 3);
        assert_eq!(report.in_favor, 1);
        assert_eq!(report.in_opposition, 2);
        let average = report.average_sentiment.unwrap();
        assert!((average - 0.2 / 3.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_empty_comment_skipped_once_per_unique_entry() {
        let service = ScriptedService::new(&[("x", Ok(0.1))]);
        let uniques = vec![unique("", 2), unique("x", 1)];

        let report = analyze(&uniques, 100, &service, &Shutdown::never(), false).await;

        assert_eq!(report.empty_comments_skipped, 1);
        assert_eq!(report.processed, 1);
        assert_eq!(service.seen(), vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn test_cap_limits_service_calls() {
        let service = ScriptedService::new(&[("a", Ok(0.2)), ("b", Ok(0.4)), ("c", Ok(-0.9))]);
        let uniques = vec![unique("a", 1), unique("b", 1), unique("c", 1)];

        let report = analyze(&uniques, 2, &service, &Shutdown::never(), false).await;

        assert_eq!(report.processed, 2);
        assert_eq!(report.examined, 2);
        assert_eq!(service.seen(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(report.in_opposition, 0);
    }

    #[tokio::test]
    async fn test_failure_skips_only_that_item() {
        let service = ScriptedService::new(&[
            ("good", Ok(0.6)),
            ("bad", Err(AnalysisError::Status {
                status: 500,
                body: "internal".to_string(),
            })),
            ("also good", Ok(-0.2)),
        ]);
        let uniques = vec![unique("also good", 1), unique("bad", 1), unique("good", 1)];

        let report = analyze(&uniques, 100, &service, &Shutdown::never(), false).await;

        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.examined, 3);
        let average = report.average_sentiment.unwrap();
        assert!((average - 0.2).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_nothing_scored_has_no_average() {
        let service = ScriptedService::new(&[]);
        let uniques = vec![unique("", 3)];

        let report = analyze(&uniques, 100, &service, &Shutdown::never(), false).await;

        assert_eq!(report.processed, 0);
        assert_eq!(report.average_sentiment, None);
        assert_eq!(report.polarity(), None);
    }

    #[tokio::test]
    async fn test_interrupt_stops_before_first_call() {
        let service = ScriptedService::new(&[("a", Ok(0.5))]);
        let (tx, shutdown) = Shutdown::channel();
        tx.send(true).unwrap();

        let report = analyze(&[unique("a", 1)], 100, &service, &shutdown, false).await;

        assert_eq!(report.examined, 0);
        assert!(report.interrupted);
        assert!(service.seen().is_empty());
    }

    #[tokio::test]
    async fn test_interrupt_after_last_item_is_not_partial() {
        let service = ScriptedService::new(&[("a", Ok(0.5)), ("b", Ok(-0.5))]);
        let (tx, shutdown) = Shutdown::channel();

        let report = analyze(
            &[unique("a", 1), unique("b", 1)],
            100,
            &service,
            &shutdown,
            false,
        )
        .await;
        tx.send(true).unwrap();

        assert_eq!(report.examined, 2);
        assert!(!report.interrupted);
        assert!(shutdown.is_triggered());
    }

    #[test]
    fn test_tally_finish() {
        let mut tally = SentimentTally::new();
        tally.record_score(1.0);
        tally.record_score(-0.5);
        tally.record_empty();
        tally.record_failure();

        let report = tally.finish();
        assert_eq!(report.examined, 4);
        assert_eq!(report.processed, 2);
        assert_eq!(report.average_sentiment, Some(0.25));
        assert_eq!(report.in_favor, 1);
        assert_eq!(report.in_opposition, 1);
        assert!(!report.interrupted);
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let long = "a".repeat(500);
        let short = preview(&long);
        assert_eq!(short.chars().count(), LOG_PREVIEW_CHARS + 1);
        assert!(short.ends_with('…'));
        assert_eq!(preview("short"), "short");
    }
}
