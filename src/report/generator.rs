//! Report generation.
//!
//! Produces the console summary printed after every run, plus optional
//! Markdown and JSON report files.

use crate::cli::OutputFormat;
use crate::models::{AggregateReport, RunSummary, UniqueComment};
use anyhow::{Context, Result};
use std::path::Path;

/// Longest campaign excerpt shown in a report table.
const EXCERPT_CHARS: usize = 80;

/// Console lines describing the sentiment outcome.
pub fn sentiment_summary(report: &AggregateReport) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "A total of {} unique comments were processed.",
        report.processed
    ));

    match report.average_sentiment {
        Some(average) => {
            lines.push(format!(
                "The average sentiment of these comments is {:.4}",
                average
            ));
            lines.push(
                "Positive one means in approval, negative one means in opposition.".to_string(),
            );
            let direction = report
                .polarity()
                .map(|p| p.to_string())
                .unwrap_or_default();
            lines.push(format!("Generally speaking, the comments are {}.", direction));
        }
        None => lines.push("No comments could be scored, so there is no sentiment data.".to_string()),
    }

    lines.push(format!(
        "There were {} comments in favor and {} in opposition.",
        report.in_favor, report.in_opposition
    ));

    if report.empty_comments_skipped > 0 || report.failed > 0 {
        lines.push(format!(
            "Skipped {} empty and {} failed comments.",
            report.empty_comments_skipped, report.failed
        ));
    }

    if report.interrupted {
        lines.push(format!(
            "Analysis was interrupted after {} comments; these results are partial.",
            report.examined
        ));
    }

    lines.join("\n")
}

/// Console lines describing the deduplication outcome.
pub fn dedupe_summary(summary: &RunSummary) -> String {
    format!(
        "Loaded {} filings from the {}.\nFiltered down to a total of {} unique comments.\nWith a total of {} duplicates removed.",
        summary.total_filings, summary.source, summary.unique_comments, summary.duplicates_removed
    )
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(summary: &RunSummary) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Docket {} Comment Report\n\n", summary.docket_id));
    output.push_str(&generate_metadata_section(summary));
    output.push_str(&generate_dedupe_section(summary));
    output.push_str(&generate_campaigns_section(&summary.top_campaigns));
    output.push_str(&generate_sentiment_section(summary));
    output.push_str("---\n\n*Report generated by commentsift*\n");

    output
}

fn generate_metadata_section(summary: &RunSummary) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Docket:** {}\n", summary.docket_id));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Source:** {}\n", summary.source));
    section.push_str(&format!("- **Analysis Cap:** {}\n", summary.analysis_cap));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n\n",
        summary.duration_seconds
    ));

    section
}

fn generate_dedupe_section(summary: &RunSummary) -> String {
    let mut section = String::new();

    section.push_str("## Deduplication\n\n");
    section.push_str("| Filings | Unique Comments | Duplicates Removed | Duplicate Share |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");

    let share = if summary.total_filings == 0 {
        0.0
    } else {
        summary.duplicates_removed as f64 / summary.total_filings as f64 * 100.0
    };
    section.push_str(&format!(
        "| {} | {} | {} | {:.1}% |\n\n",
        summary.total_filings, summary.unique_comments, summary.duplicates_removed, share
    ));

    section
}

fn generate_campaigns_section(campaigns: &[UniqueComment]) -> String {
    if campaigns.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Largest Campaigns\n\n");
    section.push_str("| Copies | Comment |\n");
    section.push_str("|:---:|:---|\n");

    for campaign in campaigns {
        let text = if campaign.text.is_empty() {
            "*(empty comment)*".to_string()
        } else {
            excerpt(&campaign.text)
        };
        section.push_str(&format!("| {} | {} |\n", campaign.count, text));
    }
    section.push('\n');

    section
}

fn generate_sentiment_section(summary: &RunSummary) -> String {
    let mut section = String::new();

    section.push_str("## Sentiment\n\n");

    let Some(report) = &summary.sentiment else {
        section.push_str("Sentiment analysis was not run.\n\n");
        return section;
    };

    let average = report
        .average_sentiment
        .map(|a| format!("{:.4}", a))
        .unwrap_or_else(|| "n/a".to_string());
    let direction = report
        .polarity()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "no data".to_string());

    section.push_str("| Processed | Average | Overall | In Favor | In Opposition | Empty | Failed |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} | {} | {} |\n\n",
        report.processed,
        average,
        direction,
        report.in_favor,
        report.in_opposition,
        report.empty_comments_skipped,
        report.failed
    ));
    section.push_str(
        "Scores range from -1 (opposition) to 1 (approval). Each unique comment counts once, \
         regardless of how many times it was submitted.\n\n",
    );

    section
}

/// Single-line, table-safe excerpt of a comment.
fn excerpt(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = flat.chars();
    let mut short: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        short.push('…');
    }
    short.replace('|', "\\|")
}

/// Generate a JSON report.
pub fn generate_json_report(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).map_err(Into::into)
}

/// Render the report in `format` and write it to `path`.
pub fn write_report(summary: &RunSummary, format: OutputFormat, path: &Path) -> Result<()> {
    let content = match format {
        OutputFormat::Json => generate_json_report(summary)?,
        OutputFormat::Markdown => generate_markdown_report(summary),
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
