//! HTTP client for the utility's planned-outages feed

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;

use super::normalize::{normalize_groups, predict_on_time, slots_for_day, RawFeed};
use super::{Group, OutageStatus, ScheduleSlot};
use crate::utils::time::local_date_of;

/// Errors raised while fetching or decoding the outage feed
#[derive(Error, Debug)]
pub enum FeedError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the feed
    #[error("Feed returned status {0}")]
    Status(u16),

    /// Response body did not decode as a feed payload
    #[error("Feed payload decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// Feed answered with an empty payload
    #[error("Feed returned an empty payload")]
    EmptyResponse,
}

impl FeedError {
    /// Whether the next poll cycle may reasonably succeed unchanged.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Status(_) | Self::EmptyResponse => true,
            Self::Decode(_) => false,
        }
    }
}

/// Feed endpoint coordinates for one household.
#[derive(Debug, Clone)]
pub struct FeedTarget {
    pub region_id: u32,
    pub dso_id: u32,
    pub group: Group,
}

/// Client for the planned-outages feed with request pacing.
pub struct ScheduleClient {
    client: reqwest::Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    base_url: String,
    target: FeedTarget,
}

const DEFAULT_FEED_URL: &str = "https://app.yasno.ua/api/blackout-service/public/shutdowns";

impl ScheduleClient {
    /// Create a client against the public feed endpoint.
    pub fn new(target: FeedTarget, timeout: Duration) -> Result<Self, FeedError> {
        Self::with_base_url(DEFAULT_FEED_URL, target, timeout)
    }

    /// Create a client against a custom endpoint (tests, mirrors).
    pub fn with_base_url(
        base_url: &str,
        target: FeedTarget,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()?;

        // one request per second is plenty for a feed polled every few minutes
        let quota = Quota::per_second(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(quota);

        Ok(Self {
            client,
            rate_limiter,
            base_url: base_url.trim_end_matches('/').to_string(),
            target,
        })
    }

    pub fn group(&self) -> Group {
        self.target.group
    }

    /// Fetch and normalize the feed: canonical slot lists for every group.
    pub async fn planned_outages(&self) -> Result<HashMap<Group, Vec<ScheduleSlot>>, FeedError> {
        self.rate_limiter.until_ready().await;

        let url = format!(
            "{}/regions/{}/dsos/{}/planned-outages",
            self.base_url, self.target.region_id, self.target.dso_id
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let raw: RawFeed = serde_json::from_slice(&response.bytes().await?)?;
        if raw.is_empty() {
            return Err(FeedError::EmptyResponse);
        }

        Ok(normalize_groups(&raw))
    }

    /// Canonical slots for the configured group; a group absent from the
    /// feed means no slots, not an error.
    pub async fn group_slots(&self) -> Result<Vec<ScheduleSlot>, FeedError> {
        let mut groups = self.planned_outages().await?;
        Ok(groups.remove(&self.target.group).unwrap_or_default())
    }

    /// Configured group's slots for `today + day_offset`.
    pub async fn slots_for_day_offset(
        &self,
        now_ts: i64,
        day_offset: i64,
    ) -> Result<Vec<ScheduleSlot>, FeedError> {
        let slots = self.group_slots().await?;
        let Some(base_date) = local_date_of(now_ts) else {
            return Ok(Vec::new());
        };
        Ok(slots_for_day(&slots, base_date, day_offset))
    }

    /// Predicted power-return time when `now_ts` is inside an outage slot.
    ///
    /// Feed failures are logged and reported as "no prediction" so status
    /// notifications never fail on the feed.
    pub async fn predict_on_time(&self, now_ts: i64) -> Option<(i64, OutageStatus)> {
        match self.group_slots().await {
            Ok(slots) => predict_on_time(now_ts, &slots),
            Err(e) => {
                tracing::warn!(error = %e, "schedule feed unavailable for prediction");
                None
            }
        }
    }
}
