//! Subscriber list persisted as a JSON file

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::StoreError;
use crate::models::Subscriber;

/// File-backed subscriber list.
///
/// Historic deployments stored a bare list of chat ids; that shape is
/// still readable and gets rewritten in the current record form on load.
pub struct SubscriberStore {
    path: PathBuf,
}

impl SubscriberStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the subscriber list; missing or malformed files yield an
    /// empty list.
    pub fn load(&self) -> Vec<Subscriber> {
        if !self.path.exists() {
            return Vec::new();
        }

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read subscribers file");
                return Vec::new();
            }
        };

        let value: Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "malformed subscribers file");
                return Vec::new();
            }
        };

        let Value::Array(items) = value else {
            return Vec::new();
        };

        // legacy format: a plain list of chat ids
        if items.iter().all(|item| item.is_i64()) && !items.is_empty() {
            let subs: Vec<Subscriber> = items
                .iter()
                .filter_map(Value::as_i64)
                .map(Subscriber::new)
                .collect();
            if let Err(e) = self.save(&subs) {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to upgrade subscribers file format");
            }
            return subs;
        }

        items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()
    }

    /// Persist the subscriber list atomically.
    pub fn save(&self, subscribers: &[Subscriber]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_vec_pretty(subscribers)?)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}
