//! JSON snapshot persistence for the in-memory store.

use super::StoreError;
use crate::model::{Endpoint, Project};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of the whole store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub projects: Vec<Project>,
    /// Endpoints of all projects, each project's in creation order.
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl Snapshot {
    pub fn new(projects: Vec<Project>, endpoints: Vec<Endpoint>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            projects,
            endpoints,
        }
    }
}

/// Location of a snapshot on disk.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, or `None` when no file exists yet.
    pub fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        if !self.path.exists() {
            debug!("Snapshot {:?} does not exist, starting empty", self.path);
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path).map_err(|e| unavailable(&self.path, e))?;
        let snapshot: Snapshot =
            serde_json::from_str(&json).map_err(|e| unavailable(&self.path, e))?;

        info!(
            "Loaded {} projects and {} endpoints from {:?}",
            snapshot.projects.len(),
            snapshot.endpoints.len(),
            self.path
        );
        Ok(Some(snapshot))
    }

    /// Write the snapshot to a sibling temp file and rename it into place.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(snapshot).map_err(|e| unavailable(&self.path, e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| unavailable(parent, e))?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| unavailable(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| unavailable(&self.path, e))?;
        Ok(())
    }
}

fn unavailable(path: &Path, err: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("absent.json"));
        assert_eq!(file.load().unwrap(), None);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("nested/state.json"));
        file.save(&Snapshot::default()).unwrap();
        assert!(file.path().exists());
        assert!(!file.path().with_extension("tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        let err = SnapshotFile::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
