//! svitlo - household power availability tracker
//!
//! Turns a sparse log of on/off grid events into availability analytics,
//! normalizes a utility's outage-schedule feed into a canonical per-day
//! timetable, detects real timetable changes, and fans notifications out
//! to chat subscribers under strict rate limits.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Core data structures and types
//! - [`analytics`] - Pure interval analytics over the event log
//! - [`schedule`] - Feed client, normalization, cache and watchdog
//! - [`dispatch`] - Rate-limited notification dispatcher
//! - [`storage`] - Event log, state blobs and the subscriber list
//! - [`service`] - Status-change orchestration
//! - [`metrics`] - Prometheus gauges derived from the analytics
//!
//! # Example
//!
//! ```no_run
//! use svitlo::commands;
//! use svitlo::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     commands::serve(config).await?;
//!     Ok(())
//! }
//! ```

// Initialize rust-i18n at crate root level
rust_i18n::i18n!("locales", fallback = "en");

pub mod analytics;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod i18n;
pub mod metrics;
pub mod models;
pub mod schedule;
pub mod service;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analytics::{
        compute_day_hourly_online, compute_day_stats, compute_uptime_ratio_window,
        get_last_transitions, DayStats, Outage,
    };
    pub use crate::config::Config;
    pub use crate::dispatch::{Dispatcher, RateLimits, Transport};
    pub use crate::error::{Error, Result};
    pub use crate::models::{PowerEvent, PowerState, Subscriber};
    pub use crate::schedule::{Group, OutageStatus, ScheduleClient, ScheduleSlot};
    pub use crate::service::StatusService;
    pub use crate::storage::{EventStore, StateStore, SubscriberStore};
}

// Direct re-exports for convenience
pub use models::{PowerEvent, PowerState, Subscriber};
