//! Append-only power event log backed by SQLite

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

use super::StoreError;
use crate::models::PowerEvent;

/// Append-only ordered log of power status events.
///
/// The connection is guarded by a mutex, so appends and reads serialize
/// internally; callers need no external locking. Events are never
/// deleted.
pub struct EventStore {
    conn: Mutex<Connection>,
}

impl EventStore {
    /// Open (or create) the event log at `path`.
    ///
    /// Failure here is fatal at startup: without the log there is nothing
    /// to track.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Init {
                path: parent.display().to_string(),
                source,
            })?;
        }

        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory log (tests).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS power_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts INTEGER NOT NULL,
                status INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Append one status observation.
    pub fn append(&self, ts: i64, is_online: bool) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        conn.execute(
            "INSERT INTO power_events (ts, status) VALUES (?1, ?2)",
            (ts, i64::from(is_online)),
        )?;
        Ok(())
    }

    /// All events in ascending timestamp order.
    pub fn list_events(&self) -> Result<Vec<PowerEvent>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        let mut stmt = conn.prepare("SELECT ts, status FROM power_events ORDER BY ts ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(PowerEvent {
                ts: row.get(0)?,
                is_online: row.get::<_, i64>(1)? != 0,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Number of logged events.
    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM power_events", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_list_ordered() {
        let store = EventStore::open_in_memory().unwrap();
        store.append(300, false).unwrap();
        store.append(100, true).unwrap();
        store.append(200, false).unwrap();

        let events = store.list_events().unwrap();
        assert_eq!(events.len(), 3);
        assert!(events.windows(2).all(|w| w[0].ts <= w[1].ts));
        assert_eq!(events[0], PowerEvent::new(100, true));
    }

    #[test]
    fn test_count() {
        let store = EventStore::open_in_memory().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        store.append(1, true).unwrap();
        store.append(2, false).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/data/power_events.db");
        let store = EventStore::open(&path).unwrap();
        store.append(1, true).unwrap();
        assert!(path.exists());
    }
}
