//! On-disk snapshot of a docket's filings.
//!
//! The snapshot is a plain cache: when the file exists it is used as-is and
//! the docket API is never contacted.

use crate::error::{PipelineError, Result};
use crate::models::FilingSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default snapshot location, relative to the working directory.
pub const DEFAULT_SNAPSHOT_PATH: &str = "fetched.json";

/// Reads and writes the filing snapshot at a fixed path.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a snapshot is present.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the full filing set from disk.
    pub fn load(&self) -> Result<FilingSet> {
        let data = fs::read(&self.path).map_err(|source| PipelineError::Io {
            path: self.path.clone(),
            source,
        })?;

        let filings: FilingSet =
            serde_json::from_slice(&data).map_err(|source| PipelineError::Parse {
                origin: format!("snapshot {}", self.path.display()),
                source,
            })?;

        info!(
            "Loaded {} filings from snapshot {}",
            filings.len(),
            self.path.display()
        );
        Ok(filings)
    }

    /// Persist the filing set, replacing any previous snapshot.
    ///
    /// The document is written to a sibling temp file first and renamed into
    /// place, so readers never observe a partially written snapshot.
    pub fn save(&self, filings: &FilingSet) -> Result<()> {
        let json = serde_json::to_vec_pretty(filings).map_err(|source| PipelineError::Parse {
            origin: "filing set".to_string(),
            source,
        })?;

        let tmp_path = self.tmp_path();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        fs::write(&tmp_path, &json).map_err(io_error(&tmp_path))?;
        if let Err(source) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(io_error(&self.path)(source));
        }

        debug!("Wrote {} bytes to {}", json.len(), self.path.display());
        info!(
            "Saved {} filings to snapshot {}",
            filings.len(),
            self.path.display()
        );
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PipelineError {
    let path = path.to_path_buf();
    move |source| PipelineError::Io { path, source }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_PATH)
    }
}
