//! Interval analytics over the power event log
//!
//! All operations here are pure, deterministic, single-pass computations
//! over an ascending-timestamp event sequence. Nothing is mutated and no
//! I/O happens; callers load events from the store and pass them in.
//!
//! A day window is `[local midnight, next local midnight)`, clipped to
//! `now_ts` when the day is the current local day. The status in effect
//! at the window start ("carry-over") is taken from the most recent event
//! strictly before the window; without a carry-over the walk is seeded
//! from the first in-window event.

mod uptime;

pub use uptime::compute_uptime_ratio_window;

use serde::{Deserialize, Serialize};

use crate::models::PowerEvent;
use crate::utils::time::{day_window, local_date_of};

/// One outage interval inside a day window.
///
/// `end_ts` is None only for the final, still-ongoing outage of the
/// current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outage {
    pub start_ts: i64,
    pub end_ts: Option<i64>,
}

/// Derived availability figures for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStats {
    pub on_seconds: i64,
    pub off_seconds: i64,
    pub outages: Vec<Outage>,
    pub day_start_ts: i64,
    pub day_end_ts: i64,
}

impl DayStats {
    /// Fraction of the accounted time that was online, if any time was
    /// accounted at all.
    pub fn availability(&self) -> Option<f64> {
        let total = self.on_seconds + self.off_seconds;
        if total > 0 {
            Some(self.on_seconds as f64 / total as f64)
        } else {
            None
        }
    }
}

/// Compute on/off totals and outage intervals for a calendar day.
///
/// Returns None when there is no carry-over event and no event inside
/// the window (no data for that day). Out-of-order timestamps clamp to
/// zero-duration segments rather than producing negative time.
pub fn compute_day_stats(
    day: chrono::NaiveDate,
    events: &[PowerEvent],
    now_ts: i64,
) -> Option<DayStats> {
    let (day_start_ts, mut day_end_ts) = day_window(day)?;
    if local_date_of(now_ts) == Some(day) {
        day_end_ts = day_end_ts.min(now_ts);
    }

    let mut before = None;
    for ev in events {
        if ev.ts < day_start_ts {
            before = Some(*ev);
        } else {
            break;
        }
    }

    // the window-end boundary is included so an event landing exactly on
    // it still closes (or opens) an outage record at zero duration
    let in_day: Vec<PowerEvent> = events
        .iter()
        .filter(|ev| ev.ts >= day_start_ts && ev.ts <= day_end_ts)
        .copied()
        .collect();

    if before.is_none() && in_day.is_empty() {
        return None;
    }

    let (mut cur_status, mut current_ts, idx_start) = match before {
        Some(ev) => (ev.is_online, day_start_ts, 0),
        None => (in_day[0].is_online, in_day[0].ts, 1),
    };
    let mut off_start_ts = if cur_status { None } else { Some(current_ts) };

    let mut on_seconds = 0i64;
    let mut off_seconds = 0i64;
    let mut outages: Vec<Outage> = Vec::new();

    for ev in &in_day[idx_start..] {
        let duration = (ev.ts - current_ts).max(0);
        if cur_status {
            on_seconds += duration;
        } else {
            off_seconds += duration;
        }

        if cur_status && !ev.is_online {
            off_start_ts = Some(ev.ts);
        } else if !cur_status && ev.is_online {
            outages.push(Outage {
                start_ts: off_start_ts.unwrap_or(current_ts),
                end_ts: Some(ev.ts),
            });
            off_start_ts = None;
        }

        cur_status = ev.is_online;
        current_ts = ev.ts;
    }

    // close the final segment against the window end
    let duration = (day_end_ts - current_ts).max(0);
    if cur_status {
        on_seconds += duration;
    } else {
        off_seconds += duration;
    }

    if !cur_status && duration > 0 {
        outages.push(Outage {
            start_ts: off_start_ts.unwrap_or(current_ts),
            end_ts: None,
        });
    }

    Some(DayStats {
        on_seconds,
        off_seconds,
        outages,
        day_start_ts,
        day_end_ts,
    })
}

/// Online seconds per local hour of a calendar day.
///
/// Same window and seeding rules as [`compute_day_stats`]; the bucket sum
/// always equals that day's `on_seconds`.
pub fn compute_day_hourly_online(
    day: chrono::NaiveDate,
    events: &[PowerEvent],
    now_ts: i64,
) -> Option<[i64; 24]> {
    let (day_start_ts, mut day_end_ts) = day_window(day)?;
    if local_date_of(now_ts) == Some(day) {
        day_end_ts = day_end_ts.min(now_ts);
    }

    let mut before = None;
    for ev in events {
        if ev.ts < day_start_ts {
            before = Some(*ev);
        } else {
            break;
        }
    }

    let in_day: Vec<PowerEvent> = events
        .iter()
        .filter(|ev| ev.ts >= day_start_ts && ev.ts <= day_end_ts)
        .copied()
        .collect();

    if before.is_none() && in_day.is_empty() {
        return None;
    }

    let (mut cur_status, mut cur_ts, idx_start) = match before {
        Some(ev) => (ev.is_online, day_start_ts, 0),
        None => (in_day[0].is_online, in_day[0].ts, 1),
    };

    let mut online = [0i64; 24];

    let mut add_segment = |start_ts: i64, end_ts: i64| {
        if end_ts <= start_ts {
            return;
        }
        let mut s = start_ts;
        while s < end_ts {
            let hour_idx = ((s - day_start_ts) / 3600).clamp(0, 23);
            let hour_end_ts = day_start_ts + (hour_idx + 1) * 3600;
            let seg_end = end_ts.min(hour_end_ts);
            if seg_end <= s {
                // past the last bucket (25-hour DST day); credit the
                // remainder to hour 23 so the bucket sum stays exact
                online[23] += end_ts - s;
                break;
            }
            online[hour_idx as usize] += seg_end - s;
            s = seg_end;
        }
    };

    for ev in &in_day[idx_start..] {
        if cur_status {
            add_segment(cur_ts, ev.ts);
        }
        cur_status = ev.is_online;
        cur_ts = ev.ts;
    }

    if cur_ts < day_end_ts && cur_status {
        add_segment(cur_ts, day_end_ts);
    }

    Some(online)
}

/// Timestamps of the most recent on→off and off→on edges over the whole
/// event history (not windowed).
pub fn get_last_transitions(events: &[PowerEvent]) -> (Option<i64>, Option<i64>) {
    let mut last_off_ts = None;
    let mut last_on_ts = None;

    let Some(first) = events.first() else {
        return (None, None);
    };
    let mut prev_status = first.is_online;

    for ev in &events[1..] {
        if prev_status && !ev.is_online {
            last_off_ts = Some(ev.ts);
        } else if !prev_status && ev.is_online {
            last_on_ts = Some(ev.ts);
        }
        prev_status = ev.is_online;
    }

    (last_off_ts, last_on_ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::local_midnight_ts;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn ev(ts: i64, on: bool) -> PowerEvent {
        PowerEvent::new(ts, on)
    }

    #[test]
    fn test_no_data_returns_none() {
        let d = day();
        let (_, end) = day_window(d).unwrap();
        assert!(compute_day_stats(d, &[], end + 10).is_none());
        assert!(compute_day_hourly_online(d, &[], end + 10).is_none());
    }

    #[test]
    fn test_carry_over_fills_whole_window() {
        let d = day();
        let (start, end) = day_window(d).unwrap();
        // went online the evening before; no events inside the day
        let events = [ev(start - 7200, true)];
        let stats = compute_day_stats(d, &events, end + 10).unwrap();
        assert_eq!(stats.on_seconds, end - start);
        assert_eq!(stats.off_seconds, 0);
        assert!(stats.outages.is_empty());
    }

    #[test]
    fn test_single_outage_closed_by_recovery() {
        let d = day();
        let (start, end) = day_window(d).unwrap();
        let events = [
            ev(start - 100, true),
            ev(start + 3600, false),
            ev(start + 7200, true),
        ];
        let stats = compute_day_stats(d, &events, end + 10).unwrap();
        assert_eq!(stats.off_seconds, 3600);
        assert_eq!(stats.on_seconds, (end - start) - 3600);
        assert_eq!(
            stats.outages,
            vec![Outage {
                start_ts: start + 3600,
                end_ts: Some(start + 7200),
            }]
        );
    }

    #[test]
    fn test_open_outage_when_still_offline() {
        let d = day();
        let (start, _) = day_window(d).unwrap();
        let now = start + 10_000;
        let events = [ev(start - 100, true), ev(start + 3600, false)];
        let stats = compute_day_stats(d, &events, now).unwrap();
        assert_eq!(stats.day_end_ts, now);
        assert_eq!(stats.outages.len(), 1);
        assert_eq!(stats.outages[0].start_ts, start + 3600);
        assert!(stats.outages[0].end_ts.is_none());
        assert_eq!(stats.off_seconds, now - (start + 3600));
    }

    #[test]
    fn test_offline_carry_over_opens_outage_at_window_start() {
        let d = day();
        let (start, end) = day_window(d).unwrap();
        let events = [ev(start - 500, false), ev(start + 1800, true)];
        let stats = compute_day_stats(d, &events, end + 10).unwrap();
        assert_eq!(
            stats.outages,
            vec![Outage {
                start_ts: start,
                end_ts: Some(start + 1800),
            }]
        );
        assert_eq!(stats.off_seconds, 1800);
    }

    #[test]
    fn test_on_off_totals_cover_window_with_carry_over() {
        let d = day();
        let (start, end) = day_window(d).unwrap();
        let events = [
            ev(start - 10, false),
            ev(start + 1000, true),
            ev(start + 5000, false),
            ev(start + 9000, true),
        ];
        let stats = compute_day_stats(d, &events, end + 10).unwrap();
        assert_eq!(stats.on_seconds + stats.off_seconds, end - start);
    }

    #[test]
    fn test_duplicate_timestamps_are_zero_duration() {
        let d = day();
        let (start, end) = day_window(d).unwrap();
        let events = [
            ev(start - 10, true),
            ev(start + 100, false),
            ev(start + 100, true),
        ];
        let stats = compute_day_stats(d, &events, end + 10).unwrap();
        assert_eq!(stats.off_seconds, 0);
        assert_eq!(stats.on_seconds, end - start);
        assert_eq!(
            stats.outages,
            vec![Outage {
                start_ts: start + 100,
                end_ts: Some(start + 100),
            }]
        );
    }

    #[test]
    fn test_hourly_sum_matches_day_stats() {
        let d = day();
        let (start, end) = day_window(d).unwrap();
        let events = [
            ev(start - 60, true),
            ev(start + 90 * 60, false),
            ev(start + 200 * 60, true),
            ev(start + 700 * 60, false),
        ];
        let now = end + 10;
        let stats = compute_day_stats(d, &events, now).unwrap();
        let hourly = compute_day_hourly_online(d, &events, now).unwrap();
        assert_eq!(hourly.iter().sum::<i64>(), stats.on_seconds);
    }

    #[test]
    fn test_hourly_splits_across_hour_boundary() {
        let d = day();
        let (start, end) = day_window(d).unwrap();
        // online from 00:30 to 01:30
        let events = [
            ev(start, false),
            ev(start + 1800, true),
            ev(start + 5400, false),
        ];
        let hourly = compute_day_hourly_online(d, &events, end + 10).unwrap();
        assert_eq!(hourly[0], 1800);
        assert_eq!(hourly[1], 1800);
        assert_eq!(hourly[2], 0);
    }

    #[test]
    fn test_last_transitions_empty_and_flat() {
        assert_eq!(get_last_transitions(&[]), (None, None));
        // no flips at all
        let events = [ev(10, true), ev(20, true), ev(30, true)];
        assert_eq!(get_last_transitions(&events), (None, None));
    }

    #[test]
    fn test_last_transitions_reports_latest_edges() {
        let events = [
            ev(10, true),
            ev(20, false),
            ev(30, true),
            ev(40, false),
            ev(50, true),
        ];
        let (last_off, last_on) = get_last_transitions(&events);
        assert_eq!(last_off, Some(40));
        assert_eq!(last_on, Some(50));
    }

    #[test]
    fn test_recovery_exactly_at_window_end_closes_outage() {
        let d = day();
        let (start, _) = day_window(d).unwrap();
        let now = start + 7200;
        let events = [
            ev(start, true),
            ev(start + 3600, false),
            ev(start + 7200, true),
        ];
        let stats = compute_day_stats(d, &events, now).unwrap();
        assert_eq!(stats.on_seconds, 3600);
        assert_eq!(stats.off_seconds, 3600);
        assert_eq!(
            stats.outages,
            vec![Outage {
                start_ts: start + 3600,
                end_ts: Some(start + 7200),
            }]
        );
    }

    #[test]
    fn test_midnight_clipping_today() {
        let d = day();
        let start = local_midnight_ts(d).unwrap();
        let now = start + 7200;
        let events = [ev(start, true), ev(start + 3600, false)];
        let stats = compute_day_stats(d, &events, now).unwrap();
        assert_eq!(stats.day_end_ts, now);
        assert_eq!(stats.on_seconds, 3600);
        assert_eq!(stats.off_seconds, 3600);
    }
}
