//! Outage-schedule normalization, caching and polling
//!
//! The utility's feed publishes, per consumer group, raw day records keyed
//! by a day token (`today`, `tomorrow`, weekday index). This module turns
//! those records into a canonical slot list per group
//! ([`normalize`]), persists the per-date timetable and detects real
//! changes ([`cache`]), and drives the periodic poll that fans out
//! notifications ([`watchdog`]).

pub mod cache;
pub mod client;
pub mod normalize;
pub mod watchdog;

pub use cache::{update_day_schedule, ScheduleCache, ScheduleState};
pub use client::{FeedError, ScheduleClient};
pub use normalize::{normalize_groups, predict_on_time, slots_for_day};
pub use watchdog::ScheduleWatchdog;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::i18n::t;

/// Day status published by the feed for one group/day record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutageStatus {
    /// The published timetable applies
    ScheduleApplies,
    /// Timetable not yet published for this day
    WaitingForSchedule,
    /// Grid-wide emergency shutdowns, timetable suspended
    EmergencyShutdowns,
}

impl OutageStatus {
    /// Display title for a slot of this status, in the process locale.
    pub fn title(&self) -> String {
        match self {
            Self::ScheduleApplies => t!("schedule.title.planned").to_string(),
            Self::EmergencyShutdowns => t!("schedule.title.emergency").to_string(),
            Self::WaitingForSchedule => t!("schedule.title.probable").to_string(),
        }
    }

    /// Short outage-kind label used inside notification sentences.
    pub fn kind_label(&self, lang: &str) -> String {
        match self {
            Self::EmergencyShutdowns => t!("schedule.kind.emergency", locale = lang).to_string(),
            _ => t!("schedule.kind.planned", locale = lang).to_string(),
        }
    }

    /// Line prefix used when rendering a slot in a message.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::EmergencyShutdowns => "🚨",
            Self::ScheduleApplies => "⚡",
            Self::WaitingForSchedule => "•",
        }
    }
}

/// Raw sub-slot classification from the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SlotKind {
    #[default]
    Definite,
    NotPlanned,
}

/// A canonical outage slot: half-open `[start_ts, end_ts)` with its day
/// status and display title. Equality drives the schedule-cache diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub start_ts: i64,
    pub end_ts: i64,
    pub status: OutageStatus,
    pub title: String,
}

/// Consumer group identifier used by the feed ("1.1" .. "6.2").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    G1_1,
    G1_2,
    G2_1,
    G2_2,
    G3_1,
    G3_2,
    G4_1,
    G4_2,
    G5_1,
    G5_2,
    G6_1,
    G6_2,
}

impl Group {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::G1_1 => "1.1",
            Self::G1_2 => "1.2",
            Self::G2_1 => "2.1",
            Self::G2_2 => "2.2",
            Self::G3_1 => "3.1",
            Self::G3_2 => "3.2",
            Self::G4_1 => "4.1",
            Self::G4_2 => "4.2",
            Self::G5_1 => "5.1",
            Self::G5_2 => "5.2",
            Self::G6_1 => "6.1",
            Self::G6_2 => "6.2",
        }
    }
}

impl FromStr for Group {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.1" => Ok(Self::G1_1),
            "1.2" => Ok(Self::G1_2),
            "2.1" => Ok(Self::G2_1),
            "2.2" => Ok(Self::G2_2),
            "3.1" => Ok(Self::G3_1),
            "3.2" => Ok(Self::G3_2),
            "4.1" => Ok(Self::G4_1),
            "4.2" => Ok(Self::G4_2),
            "5.1" => Ok(Self::G5_1),
            "5.2" => Ok(Self::G5_2),
            "6.1" => Ok(Self::G6_1),
            "6.2" => Ok(Self::G6_2),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
