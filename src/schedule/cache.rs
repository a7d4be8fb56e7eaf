//! Persisted per-date schedule cache with change detection
//!
//! The cache is the sole gate between the polling loop and outbound
//! notifications: a re-poll that returns the same timetable must compare
//! equal and produce no messages. Entries are keyed by ISO calendar date;
//! the stored slot list is compared field-by-field, ordering included.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use super::ScheduleSlot;
use crate::error::Result;

/// Cached timetable for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDayEntry {
    pub slots: Vec<ScheduleSlot>,
    pub updated_at: i64,
}

/// Whole persisted cache: per-date entries plus the last poll time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleState {
    #[serde(default)]
    pub days: BTreeMap<String, ScheduleDayEntry>,
    #[serde(default)]
    pub last_check_ts: Option<i64>,
}

/// Update the cached timetable for one calendar date.
///
/// Returns true when the date had no prior entry or the slot list differs
/// from the stored one in any field or in ordering. The entry is
/// overwritten either way, stamping `updated_at = now_ts`.
pub fn update_day_schedule(
    state: &mut ScheduleState,
    date: NaiveDate,
    new_slots: &[ScheduleSlot],
    now_ts: i64,
) -> bool {
    let key = date.format("%Y-%m-%d").to_string();

    let changed = match state.days.get(&key) {
        Some(entry) => entry.slots != new_slots,
        None => true,
    };

    state.days.insert(
        key,
        ScheduleDayEntry {
            slots: new_slots.to_vec(),
            updated_at: now_ts,
        },
    );

    changed
}

/// File-backed store for [`ScheduleState`].
pub struct ScheduleCache {
    path: PathBuf,
}

impl ScheduleCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted cache. A missing, unreadable or malformed file
    /// degrades to the empty default; the next save self-heals it.
    pub fn load(&self) -> ScheduleState {
        if !self.path.exists() {
            return ScheduleState::default();
        }

        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to open schedule cache, starting empty");
                return ScheduleState::default();
            }
        };

        match serde_json::from_reader(BufReader::new(file)) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "malformed schedule cache, starting empty");
                ScheduleState::default()
            }
        }
    }

    /// Persist the cache atomically (temp file + rename).
    pub fn save(&self, state: &ScheduleState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let file = fs::File::create(&temp_path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), state)?;
        fs::rename(&temp_path, &self.path)?;

        tracing::debug!(path = %self.path.display(), days = state.days.len(), "schedule cache saved");
        Ok(())
    }
}
