//! Feed record normalization and canonical slot derivation
//!
//! Raw day records carry sub-slots as minute offsets from the record's
//! date. Canonicalization anchors each sub-slot to that date, synthesizes
//! a full-day slot for emergency days, filters out indefinite and
//! not-yet-published entries, and stitches exactly-contiguous slots across
//! a day boundary so an outage crossing midnight stays one interval.
//!
//! Day records are processed in explicit chronological token order
//! (`today`, `tomorrow`, then weekday indices); stitching correctness
//! depends on it.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::str::FromStr;

use super::{Group, OutageStatus, ScheduleSlot, SlotKind};
use crate::utils::time::{local_date_of, naive_local_ts};

/// Day tokens in the order the feed's days occur on the calendar.
pub const DAY_TOKENS: [&str; 9] = [
    "today", "tomorrow", "0", "1", "2", "3", "4", "5", "6",
];

/// One raw sub-slot: minute offsets from the owning record's date.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawSlot {
    pub start: i64,
    pub end: i64,
    #[serde(rename = "type", default)]
    pub kind: SlotKind,
}

/// One raw per-group day record from the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDay {
    #[serde(default)]
    pub slots: Vec<RawSlot>,
    #[serde(deserialize_with = "deserialize_feed_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub status: Option<OutageStatus>,
}

/// Raw feed payload: group id -> day token -> day record.
pub type RawFeed = HashMap<String, HashMap<String, RawDay>>;

/// A slot anchored to calendar dates, still in minute-offset form so
/// day-boundary stitching can compare wall-clock instants exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AnchoredSlot {
    start_min: i64,
    end_min: i64,
    kind: SlotKind,
    date_start: NaiveDate,
    date_end: NaiveDate,
    status: OutageStatus,
}

impl AnchoredSlot {
    fn naive_start(&self) -> NaiveDateTime {
        self.date_start.and_time(NaiveTime::MIN) + Duration::minutes(self.start_min)
    }

    fn naive_end(&self) -> NaiveDateTime {
        self.date_end.and_time(NaiveTime::MIN) + Duration::minutes(self.end_min)
    }

    fn into_slot(self) -> Option<ScheduleSlot> {
        Some(ScheduleSlot {
            start_ts: naive_local_ts(self.naive_start())?,
            end_ts: naive_local_ts(self.naive_end())?,
            status: self.status,
            title: self.status.title(),
        })
    }
}

fn deserialize_feed_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_feed_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized feed date: {raw}")))
}

/// The feed has been seen emitting offset datetimes, naive datetimes and
/// bare dates for the same field; accept all three.
fn parse_feed_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Canonicalize one day record: anchor sub-slots by status, then keep
/// only definite slots outside waiting-for-schedule windows.
fn canonical_day_slots(day: &RawDay) -> Vec<AnchoredSlot> {
    let anchored: Vec<AnchoredSlot> = match day.status {
        Some(status @ (OutageStatus::ScheduleApplies | OutageStatus::WaitingForSchedule)) => day
            .slots
            .iter()
            .map(|raw| AnchoredSlot {
                start_min: raw.start,
                end_min: raw.end,
                kind: raw.kind,
                date_start: day.date,
                date_end: day.date,
                status,
            })
            .collect(),
        Some(OutageStatus::EmergencyShutdowns) => vec![AnchoredSlot {
            start_min: 0,
            end_min: 1440,
            kind: SlotKind::Definite,
            date_start: day.date,
            date_end: day.date,
            status: OutageStatus::EmergencyShutdowns,
        }],
        // record without a status carries no usable timetable
        None => Vec::new(),
    };

    anchored
        .into_iter()
        .filter(|slot| {
            slot.kind == SlotKind::Definite && slot.status != OutageStatus::WaitingForSchedule
        })
        .collect()
}

/// Build the canonical slot list for every known group in the feed.
///
/// Unknown group identifiers are skipped. Within a group, day records are
/// visited in [`DAY_TOKENS`] order and a day's first slot is merged into
/// the previous day's last slot when they touch exactly and agree on kind
/// and status.
pub fn normalize_groups(raw: &RawFeed) -> HashMap<Group, Vec<ScheduleSlot>> {
    let mut groups = HashMap::new();

    for (group_id, day_map) in raw {
        let Ok(group) = Group::from_str(group_id) else {
            tracing::debug!(group = %group_id, "skipping unknown group in feed");
            continue;
        };

        let mut acc: Vec<AnchoredSlot> = Vec::new();
        for token in DAY_TOKENS {
            let Some(day) = day_map.get(token) else {
                continue;
            };

            let mut day_slots = canonical_day_slots(day);
            if let (Some(last), Some(next)) = (acc.last(), day_slots.first()) {
                if last.naive_end() == next.naive_start()
                    && last.kind == next.kind
                    && last.status == next.status
                {
                    let merged = AnchoredSlot {
                        start_min: last.start_min,
                        end_min: next.end_min,
                        kind: last.kind,
                        date_start: last.date_start,
                        date_end: next.date_end,
                        status: last.status,
                    };
                    acc.pop();
                    day_slots[0] = merged;
                }
            }
            acc.extend(day_slots);
        }

        groups.insert(group, acc.into_iter().filter_map(AnchoredSlot::into_slot).collect());
    }

    groups
}

/// Canonical slots whose start date falls on `base_date + day_offset`,
/// sorted ascending by start.
pub fn slots_for_day(
    slots: &[ScheduleSlot],
    base_date: NaiveDate,
    day_offset: i64,
) -> Vec<ScheduleSlot> {
    let Some(target) = base_date.checked_add_signed(Duration::days(day_offset)) else {
        return Vec::new();
    };

    let mut day_slots: Vec<ScheduleSlot> = slots
        .iter()
        .filter(|slot| local_date_of(slot.start_ts) == Some(target))
        .cloned()
        .collect();
    day_slots.sort_by_key(|slot| slot.start_ts);
    day_slots
}

/// If `now_ts` falls inside a canonical slot, the predicted end of that
/// slot and its status ("when power should return / next change").
pub fn predict_on_time(now_ts: i64, slots: &[ScheduleSlot]) -> Option<(i64, OutageStatus)> {
    slots
        .iter()
        .find(|slot| slot.start_ts <= now_ts && now_ts < slot.end_ts)
        .map(|slot| (slot.end_ts, slot.status))
}
