// Core data structures shared across svitlo modules

use serde::{Deserialize, Serialize};

/// A single observation of grid status at a point in time.
///
/// Events are append-only; the store guarantees ascending-timestamp
/// iteration. Duplicate timestamps are tolerated and treated as
/// zero-duration segments by the analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerEvent {
    /// Epoch seconds of the observation
    pub ts: i64,
    /// true = grid online, false = outage
    pub is_online: bool,
}

impl PowerEvent {
    pub fn new(ts: i64, is_online: bool) -> Self {
        Self { ts, is_online }
    }
}

/// Last-known grid status blob, persisted as JSON between restarts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerState {
    /// Last recorded status; None until the first observation arrives
    pub last_status: Option<bool>,
    /// When the status last flipped (epoch seconds)
    pub last_change_ts: Option<i64>,
}

impl PowerState {
    /// Record a new status, returning the previous one.
    pub fn apply(&mut self, is_online: bool, now_ts: i64) -> Option<bool> {
        let prev = self.last_status;
        self.last_status = Some(is_online);
        self.last_change_ts = Some(now_ts);
        prev
    }
}

/// A notification recipient: a chat, optionally scoped to a forum thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub chat_id: i64,
    #[serde(default)]
    pub thread_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
}

impl Subscriber {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            thread_id: None,
            title: None,
        }
    }

    pub fn with_thread(chat_id: i64, thread_id: i64) -> Self {
        Self {
            chat_id,
            thread_id: Some(thread_id),
            title: None,
        }
    }
}

impl std::fmt::Display for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.thread_id {
            Some(tid) => write!(f, "{}#{tid}", self.chat_id),
            None => write!(f, "{}", self.chat_id),
        }
    }
}
