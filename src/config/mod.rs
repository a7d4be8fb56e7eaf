//! Configuration management
//!
//! Settings load from environment variables (`SVITLO_*`) or a TOML file.
//! Feed coordinates (region, DSO, group) are optional: without them the
//! schedule watchdog and return-time predictions are simply disabled.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::dispatch::RateLimits;
use crate::schedule::client::FeedTarget;
use crate::schedule::Group;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Telegram delivery configuration
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Webhook / metrics server configuration
    #[serde(default)]
    pub web: WebConfig,

    /// Outbound send rate limits
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Outage-feed configuration
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// File and database locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    /// Bot API token; required only for commands that actually send
    #[serde(default)]
    pub bot_token: String,

    /// Operator chat for administrative notices
    #[serde(default)]
    pub admin_chat_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Bind address for the webhook server
    pub bind_host: String,

    /// Bind port
    pub port: u16,

    /// Shared secret required in webhook payloads
    pub webhook_secret: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 8080,
            webhook_secret: "CHANGE_ME_SECRET".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum sends inside one sliding window
    pub max_global_per_window: f64,

    /// Minimum spacing between sends to one recipient, seconds
    pub min_per_recipient_interval_secs: f64,

    /// Sliding window length, seconds
    pub window_secs: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_global_per_window: 25.0,
            min_per_recipient_interval_secs: 1.0,
            window_secs: 1.0,
        }
    }
}

impl RateLimitConfig {
    /// Convert to the dispatcher's limit type.
    pub fn limits(&self) -> RateLimits {
        RateLimits {
            max_global_per_window: self.max_global_per_window,
            min_per_recipient_interval: Duration::from_secs_f64(
                self.min_per_recipient_interval_secs.max(0.0),
            ),
            window: Duration::from_secs_f64(self.window_secs.max(0.0)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Feed region identifier
    #[serde(default)]
    pub region_id: Option<u32>,

    /// Feed distribution-system-operator identifier
    #[serde(default)]
    pub dso_id: Option<u32>,

    /// Consumer group ("1.1" .. "6.2")
    #[serde(default)]
    pub group: Option<String>,

    /// Seconds between feed polls
    pub poll_interval_secs: u64,

    /// Feed request timeout, seconds
    pub request_timeout_secs: u64,

    /// Feed endpoint override (tests, mirrors)
    #[serde(default)]
    pub feed_url: Option<String>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            region_id: None,
            dso_id: None,
            group: None,
            poll_interval_secs: 900,
            request_timeout_secs: 10,
            feed_url: None,
        }
    }
}

impl ScheduleConfig {
    /// Feed coordinates when the feed is fully configured.
    pub fn feed_target(&self) -> Option<FeedTarget> {
        let region_id = self.region_id?;
        let dso_id = self.dso_id?;
        let group = Group::from_str(self.group.as_deref()?).ok()?;
        Some(FeedTarget {
            region_id,
            dso_id,
            group,
        })
    }

    pub fn enabled(&self) -> bool {
        self.feed_target().is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for all state files
    pub data_dir: PathBuf,

    /// Event log override
    #[serde(default)]
    pub db_file: Option<PathBuf>,

    /// Status blob override
    #[serde(default)]
    pub state_file: Option<PathBuf>,

    /// Schedule cache override
    #[serde(default)]
    pub schedule_state_file: Option<PathBuf>,

    /// Subscriber list override
    #[serde(default)]
    pub subscribers_file: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            db_file: None,
            state_file: None,
            schedule_state_file: None,
            subscribers_file: None,
        }
    }
}

impl StorageConfig {
    pub fn db_path(&self) -> PathBuf {
        self.db_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("power_events.db"))
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("power_state.json"))
    }

    pub fn schedule_state_path(&self) -> PathBuf {
        self.schedule_state_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("schedule_state.json"))
    }

    pub fn subscribers_path(&self) -> PathBuf {
        self.subscribers_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("subscribers.json"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|v| v.parse().ok())
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            telegram: TelegramConfig {
                bot_token: env_string("SVITLO_BOT_TOKEN").unwrap_or_default(),
                admin_chat_id: env_parse("SVITLO_ADMIN_CHAT_ID"),
            },
            web: WebConfig {
                bind_host: env_string("SVITLO_BIND_HOST").unwrap_or(defaults.web.bind_host),
                port: env_parse("SVITLO_WEB_PORT").unwrap_or(defaults.web.port),
                webhook_secret: env_string("SVITLO_WEBHOOK_SECRET")
                    .unwrap_or(defaults.web.webhook_secret),
            },
            rate_limit: RateLimitConfig {
                max_global_per_window: env_parse("SVITLO_MAX_GLOBAL_PER_WINDOW")
                    .unwrap_or(defaults.rate_limit.max_global_per_window),
                min_per_recipient_interval_secs: env_parse("SVITLO_MIN_PER_CHAT_INTERVAL")
                    .unwrap_or(defaults.rate_limit.min_per_recipient_interval_secs),
                window_secs: env_parse("SVITLO_SEND_WINDOW_SEC")
                    .unwrap_or(defaults.rate_limit.window_secs),
            },
            schedule: ScheduleConfig {
                region_id: env_parse("SVITLO_FEED_REGION_ID"),
                dso_id: env_parse("SVITLO_FEED_DSO_ID"),
                group: env_string("SVITLO_FEED_GROUP"),
                poll_interval_secs: env_parse("SVITLO_FEED_POLL_INTERVAL")
                    .unwrap_or(defaults.schedule.poll_interval_secs),
                request_timeout_secs: env_parse("SVITLO_FEED_TIMEOUT")
                    .unwrap_or(defaults.schedule.request_timeout_secs),
                feed_url: env_string("SVITLO_FEED_URL"),
            },
            storage: StorageConfig {
                data_dir: env_string("SVITLO_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.data_dir),
                db_file: env_string("SVITLO_DB_FILE").map(PathBuf::from),
                state_file: env_string("SVITLO_STATE_FILE").map(PathBuf::from),
                schedule_state_file: env_string("SVITLO_SCHEDULE_STATE_FILE").map(PathBuf::from),
                subscribers_file: env_string("SVITLO_SUBSCRIBERS_FILE").map(PathBuf::from),
            },
            logging: LoggingConfig {
                level: env_string("SVITLO_LOG_LEVEL").unwrap_or(defaults.logging.level),
                format: env_string("SVITLO_LOG_FORMAT").unwrap_or(defaults.logging.format),
            },
        })
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit.max_global_per_window <= 0.0 {
            anyhow::bail!("max_global_per_window must be positive");
        }
        if self.rate_limit.window_secs <= 0.0 {
            anyhow::bail!("window_secs must be positive");
        }
        if self.rate_limit.min_per_recipient_interval_secs < 0.0 {
            anyhow::bail!("min_per_recipient_interval_secs must not be negative");
        }
        if self.schedule.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than 0");
        }

        // a partially configured feed is a misconfiguration, not "disabled"
        let feed_fields = [
            self.schedule.region_id.is_some(),
            self.schedule.dso_id.is_some(),
            self.schedule.group.is_some(),
        ];
        if feed_fields.iter().any(|&set| set) && !feed_fields.iter().all(|&set| set) {
            anyhow::bail!("feed region_id, dso_id and group must be set together");
        }
        if let Some(group) = &self.schedule.group {
            if Group::from_str(group).is_err() {
                anyhow::bail!("unknown feed group: {group}");
            }
        }

        Ok(())
    }
}
