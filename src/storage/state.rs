//! Last-known-status blob persisted as a small JSON file

use std::fs;
use std::path::{Path, PathBuf};

use super::StoreError;
use crate::models::PowerState;

/// File-backed store for the [`PowerState`] blob.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the blob; a missing or malformed file is an empty state.
    pub fn load(&self) -> PowerState {
        if !self.path.exists() {
            return PowerState::default();
        }

        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "malformed state file, starting empty");
                    PowerState::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read state file, starting empty");
                PowerState::default()
            }
        }
    }

    /// Persist the blob atomically (temp file + rename).
    pub fn save(&self, state: &PowerState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_vec_pretty(state)?)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}
