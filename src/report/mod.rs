//! Report output.

pub mod generator;

pub use generator::{dedupe_summary, sentiment_summary, write_report};
