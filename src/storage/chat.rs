//! Per-chat language settings backed by SQLite

use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use super::StoreError;

/// Language preference per chat (and, for forum supergroups, per thread).
pub struct ChatSettings {
    conn: Mutex<Connection>,
    default_lang: String,
}

impl ChatSettings {
    pub fn open(path: &Path, default_lang: impl Into<String>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn, default_lang)
    }

    pub fn open_in_memory(default_lang: impl Into<String>) -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, default_lang)
    }

    fn init(conn: Connection, default_lang: impl Into<String>) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS chat_settings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id INTEGER NOT NULL,
                thread_id INTEGER,
                lang TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE(chat_id, thread_id)
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            default_lang: default_lang.into(),
        })
    }

    /// Stored language for the chat/thread, if any.
    pub fn chat_lang(&self, chat_id: i64, thread_id: Option<i64>) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        let lang = match thread_id {
            Some(tid) => conn
                .query_row(
                    "SELECT lang FROM chat_settings WHERE chat_id=?1 AND thread_id=?2",
                    (chat_id, tid),
                    |row| row.get(0),
                )
                .optional()?,
            None => conn
                .query_row(
                    "SELECT lang FROM chat_settings WHERE chat_id=?1 AND thread_id IS NULL",
                    (chat_id,),
                    |row| row.get(0),
                )
                .optional()?,
        };
        Ok(lang)
    }

    /// Resolved language for the chat/thread; storage errors and missing
    /// rows both fall back to the default.
    pub fn lang_for_chat(&self, chat_id: i64, thread_id: Option<i64>) -> String {
        match self.chat_lang(chat_id, thread_id) {
            Ok(Some(lang)) => lang,
            Ok(None) => self.default_lang.clone(),
            Err(e) => {
                tracing::warn!(chat_id, error = %e, "failed to read chat language");
                self.default_lang.clone()
            }
        }
    }

    /// Store (insert or update) the language for the chat/thread.
    pub fn set_chat_lang(
        &self,
        chat_id: i64,
        thread_id: Option<i64>,
        lang: &str,
        now_ts: i64,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        let updated = match thread_id {
            Some(tid) => conn.execute(
                "UPDATE chat_settings SET lang=?1, updated_at=?2 WHERE chat_id=?3 AND thread_id=?4",
                (lang, now_ts, chat_id, tid),
            )?,
            None => conn.execute(
                "UPDATE chat_settings SET lang=?1, updated_at=?2 WHERE chat_id=?3 AND thread_id IS NULL",
                (lang, now_ts, chat_id),
            )?,
        };

        if updated == 0 {
            conn.execute(
                "INSERT INTO chat_settings (chat_id, thread_id, lang, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                (chat_id, thread_id, lang, now_ts),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lang_for_unknown_chat() {
        let settings = ChatSettings::open_in_memory("uk").unwrap();
        assert_eq!(settings.lang_for_chat(1, None), "uk");
    }

    #[test]
    fn test_set_and_get_lang() {
        let settings = ChatSettings::open_in_memory("uk").unwrap();
        settings.set_chat_lang(1, None, "en", 100).unwrap();
        assert_eq!(settings.lang_for_chat(1, None), "en");
        // update path
        settings.set_chat_lang(1, None, "uk", 200).unwrap();
        assert_eq!(settings.lang_for_chat(1, None), "uk");
    }

    #[test]
    fn test_thread_scoped_lang_is_independent() {
        let settings = ChatSettings::open_in_memory("uk").unwrap();
        settings.set_chat_lang(1, Some(5), "en", 100).unwrap();
        assert_eq!(settings.lang_for_chat(1, Some(5)), "en");
        assert_eq!(settings.lang_for_chat(1, None), "uk");
    }
}
