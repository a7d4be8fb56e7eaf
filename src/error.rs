//! Unified error handling for the svitlo crate
//!
//! Domain-specific errors live next to the code that raises them
//! ([`FeedError`] in the schedule client, [`TransportError`] in the
//! dispatcher, [`StoreError`] in storage); this module wraps them into a
//! single [`Error`] enum usable across module boundaries.

use std::io;
use thiserror::Error;

pub use crate::dispatch::TransportError;
pub use crate::schedule::client::FeedError;
pub use crate::storage::StoreError;

/// Unified error type for the svitlo crate
#[derive(Error, Debug)]
pub enum Error {
    /// Outage-feed fetch or parse errors
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    /// Message transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Event-log and file-state storage errors
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the failure is transient and the enclosing loop should
    /// simply try again next cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Feed(e) => e.is_transient(),
            Self::Transport(_) | Self::Http(_) | Self::Io(_) => true,
            Self::Store(_) | Self::Database(_) | Self::Json(_) | Self::Config(_) => false,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
