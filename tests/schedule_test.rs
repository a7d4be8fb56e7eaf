//! Tests for schedule normalization and the change-detecting cache

use chrono::NaiveDate;
use std::collections::HashMap;
use svitlo::schedule::normalize::{normalize_groups, RawDay, RawFeed};
use svitlo::schedule::{update_day_schedule, Group, OutageStatus, ScheduleSlot, ScheduleState};

fn feed_json(value: serde_json::Value) -> RawFeed {
    serde_json::from_value(value).unwrap()
}

fn g11(feed: &RawFeed) -> Vec<ScheduleSlot> {
    normalize_groups(feed).remove(&Group::G1_1).unwrap()
}

#[test]
fn raw_day_deserializes_from_feed_shape() {
    let day: RawDay = serde_json::from_value(serde_json::json!({
        "date": "2025-11-28T00:00:00+02:00",
        "status": "ScheduleApplies",
        "slots": [{"start": 600, "end": 780, "type": "Definite"}]
    }))
    .unwrap();

    assert_eq!(day.date, NaiveDate::from_ymd_opt(2025, 11, 28).unwrap());
    assert_eq!(day.status, Some(OutageStatus::ScheduleApplies));
    assert_eq!(day.slots.len(), 1);
}

#[test]
fn contiguous_same_status_slots_merge_with_summed_duration() {
    let feed = feed_json(serde_json::json!({
        "1.1": {
            "today": {
                "date": "2025-11-28",
                "status": "ScheduleApplies",
                "slots": [{"start": 1320, "end": 1440, "type": "Definite"}]
            },
            "tomorrow": {
                "date": "2025-11-29",
                "status": "ScheduleApplies",
                "slots": [{"start": 0, "end": 240, "type": "Definite"}]
            }
        }
    }));

    let slots = g11(&feed);
    assert_eq!(slots.len(), 1);
    // 2h before midnight plus 4h after
    assert_eq!(slots[0].end_ts - slots[0].start_ts, 6 * 3600);
}

#[test]
fn differing_status_or_gap_prevents_merge() {
    // same boundary, different status
    let feed = feed_json(serde_json::json!({
        "1.1": {
            "today": {
                "date": "2025-11-28",
                "status": "ScheduleApplies",
                "slots": [{"start": 1320, "end": 1440, "type": "Definite"}]
            },
            "tomorrow": {
                "date": "2025-11-29",
                "status": "EmergencyShutdowns",
                "slots": []
            }
        }
    }));
    assert_eq!(g11(&feed).len(), 2);

    // one-minute gap at midnight
    let feed = feed_json(serde_json::json!({
        "1.1": {
            "today": {
                "date": "2025-11-28",
                "status": "ScheduleApplies",
                "slots": [{"start": 1320, "end": 1439, "type": "Definite"}]
            },
            "tomorrow": {
                "date": "2025-11-29",
                "status": "ScheduleApplies",
                "slots": [{"start": 0, "end": 240, "type": "Definite"}]
            }
        }
    }));
    assert_eq!(g11(&feed).len(), 2);
}

#[test]
fn waiting_for_schedule_windows_are_never_surfaced() {
    let feed = feed_json(serde_json::json!({
        "1.1": {
            "today": {
                "date": "2025-11-28",
                "status": "WaitingForSchedule",
                "slots": [{"start": 0, "end": 1440, "type": "Definite"}]
            }
        }
    }));
    assert!(g11(&feed).is_empty());
}

#[test]
fn unknown_groups_fall_out_silently() {
    let feed = feed_json(serde_json::json!({
        "bogus": {
            "today": {
                "date": "2025-11-28",
                "status": "ScheduleApplies",
                "slots": [{"start": 0, "end": 60, "type": "Definite"}]
            }
        }
    }));
    assert!(normalize_groups(&feed).is_empty());
}

fn slot(start_ts: i64, end_ts: i64) -> ScheduleSlot {
    ScheduleSlot {
        start_ts,
        end_ts,
        status: OutageStatus::ScheduleApplies,
        title: "Planned outage".to_string(),
    }
}

#[test]
fn cache_flags_first_write_then_settles() {
    let date = NaiveDate::from_ymd_opt(2025, 11, 28).unwrap();
    let mut state = ScheduleState::default();

    assert!(update_day_schedule(&mut state, date, &[slot(100, 200)], 1));
    assert!(!update_day_schedule(&mut state, date, &[slot(100, 200)], 2));
    assert!(!update_day_schedule(&mut state, date, &[slot(100, 200)], 3));
}

#[test]
fn cache_flags_any_slot_field_change() {
    let date = NaiveDate::from_ymd_opt(2025, 11, 28).unwrap();
    let mut state = ScheduleState::default();
    update_day_schedule(&mut state, date, &[slot(100, 200)], 1);

    let mut shifted = slot(100, 260);
    assert!(update_day_schedule(&mut state, date, &[shifted.clone()], 2));

    shifted.status = OutageStatus::EmergencyShutdowns;
    assert!(update_day_schedule(&mut state, date, &[shifted.clone()], 3));

    shifted.title = "renamed".to_string();
    assert!(update_day_schedule(&mut state, date, &[shifted], 4));
}

#[test]
fn cache_tracks_dates_independently() {
    let d1 = NaiveDate::from_ymd_opt(2025, 11, 28).unwrap();
    let d2 = NaiveDate::from_ymd_opt(2025, 11, 29).unwrap();
    let mut state = ScheduleState::default();

    assert!(update_day_schedule(&mut state, d1, &[slot(1, 2)], 1));
    assert!(update_day_schedule(&mut state, d2, &[slot(1, 2)], 1));
    assert!(!update_day_schedule(&mut state, d1, &[slot(1, 2)], 2));
    assert_eq!(state.days.len(), 2);
}
