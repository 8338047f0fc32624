//! Docket ingestion.
//!
//! Filings come from the local snapshot when one exists, otherwise from the
//! remote docket API, after which the snapshot is written.

pub mod fetcher;

pub use fetcher::{DocketFetcher, FetchConfig};

use crate::error::Result;
use crate::models::{DataSource, FilingSet};
use crate::shutdown::Shutdown;
use crate::snapshot::SnapshotStore;
use async_trait::async_trait;
use tracing::info;

/// Anything that can produce the complete filing set for a docket.
#[async_trait]
pub trait FilingSource: Send + Sync {
    async fn fetch_all(&self, shutdown: &Shutdown) -> Result<FilingSet>;
}

/// Load the snapshot if present, otherwise fetch and persist it.
///
/// `connect` builds the remote source and is only called when a fetch is
/// needed. With `refresh` set, an existing snapshot is ignored and
/// overwritten. Nothing is written when the fetch fails.
pub async fn load_or_fetch<S, F>(
    store: &SnapshotStore,
    connect: F,
    refresh: bool,
    shutdown: &Shutdown,
) -> Result<(FilingSet, DataSource)>
where
    S: FilingSource,
    F: FnOnce() -> Result<S>,
{
    if store.exists() && !refresh {
        info!("Using snapshot at {}", store.path().display());
        return Ok((store.load()?, DataSource::Snapshot));
    }

    let source = connect()?;
    let filings = source.fetch_all(shutdown).await?;
    store.save(&filings)?;

    Ok((filings, DataSource::Remote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::models::Filing;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct CountingSource {
        calls: Arc<AtomicUsize>,
        result: fn() -> Result<FilingSet>,
    }

    #[async_trait]
    impl FilingSource for CountingSource {
        async fn fetch_all(&self, _shutdown: &Shutdown) -> Result<FilingSet> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    /// Counts how often a source is built and how often it is fetched from.
    #[derive(Default)]
    struct Counters {
        connects: AtomicUsize,
        fetches: Arc<AtomicUsize>,
    }

    impl Counters {
        fn connect(&self, result: fn() -> Result<FilingSet>) -> Result<CountingSource> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(CountingSource {
                calls: Arc::clone(&self.fetches),
                result,
            })
        }

        fn connects(&self) -> usize {
            self.connects.load(Ordering::SeqCst)
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    fn remote_set() -> Result<FilingSet> {
        Ok(FilingSet::new(vec![Filing::with_comment("from the API")]))
    }

    fn failing() -> Result<FilingSet> {
        Err(PipelineError::Network {
            offset: 0,
            message: "unreachable".to_string(),
        })
    }

    #[tokio::test]
    async fn test_snapshot_short_circuits_fetch() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path().join("fetched.json"));
        let cached = FilingSet::new(vec![
            Filing::with_comment("cached b"),
            Filing::with_comment("cached a"),
        ]);
        store.save(&cached).unwrap();

        let counters = Counters::default();
        let (filings, origin) = load_or_fetch(
            &store,
            || counters.connect(remote_set),
            false,
            &Shutdown::never(),
        )
        .await
        .unwrap();

        assert_eq!(counters.connects(), 0);
        assert_eq!(counters.fetches(), 0);
        assert_eq!(origin, DataSource::Snapshot);
        assert_eq!(filings, cached);
    }

    #[tokio::test]
    async fn test_fetch_persists_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path().join("fetched.json"));

        let counters = Counters::default();
        let (filings, origin) = load_or_fetch(
            &store,
            || counters.connect(remote_set),
            false,
            &Shutdown::never(),
        )
        .await
        .unwrap();

        assert_eq!(counters.connects(), 1);
        assert_eq!(counters.fetches(), 1);
        assert_eq!(origin, DataSource::Remote);
        assert_eq!(store.load().unwrap(), filings);
    }

    #[tokio::test]
    async fn test_refresh_ignores_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path().join("fetched.json"));
        store.save(&FilingSet::default()).unwrap();

        let counters = Counters::default();
        let (filings, _) = load_or_fetch(
            &store,
            || counters.connect(remote_set),
            true,
            &Shutdown::never(),
        )
        .await
        .unwrap();

        assert_eq!(counters.fetches(), 1);
        assert_eq!(filings.len(), 1);
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path().join("fetched.json"));

        let counters = Counters::default();
        let result = load_or_fetch(
            &store,
            || counters.connect(failing),
            false,
            &Shutdown::never(),
        )
        .await;

        assert!(matches!(result, Err(PipelineError::Network { .. })));
        assert!(!store.exists());
    }
}
