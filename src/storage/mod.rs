//! Persistence for events, state blobs and the subscriber list
//!
//! The event log lives in SQLite; the last-known-status blob and the
//! subscriber list are small JSON files. Malformed or missing files
//! degrade to empty defaults and self-heal on the next write; only
//! event-log initialization failure is fatal at startup.

pub mod chat;
pub mod events;
pub mod state;
pub mod subscribers;

pub use chat::ChatSettings;
pub use events::EventStore;
pub use state::StateStore;
pub use subscribers::SubscriberStore;

use thiserror::Error;

/// Errors raised by the persistence layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// Storage location could not be prepared
    #[error("Failed to initialize storage at {path}: {source}")]
    Init {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// SQLite error
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
