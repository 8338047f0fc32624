//! Deduplication and sentiment aggregation.

pub mod aggregator;
pub mod dedupe;

pub use aggregator::analyze;
pub use dedupe::{dedupe, top_duplicates};
