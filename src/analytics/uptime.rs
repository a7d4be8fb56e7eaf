//! Rolling-window uptime ratio

use crate::models::PowerEvent;

/// Fraction of time online over the trailing `window_seconds` ending at
/// `now_ts`.
///
/// The window is `[now - window, now]`, clipped on the left to the first
/// event when the log starts later. Returns None for an empty log, a log
/// that starts at or after `now_ts`, or a non-positive effective window.
pub fn compute_uptime_ratio_window(
    events: &[PowerEvent],
    window_seconds: i64,
    now_ts: i64,
) -> Option<f64> {
    let first = events.first()?;

    let window_end = now_ts;
    let mut window_start = now_ts - window_seconds;

    if first.ts >= window_end {
        return None;
    }
    if window_start < first.ts {
        window_start = first.ts;
    }

    // status in effect at window_start
    let mut cur_status = first.is_online;
    for ev in events {
        if ev.ts <= window_start {
            cur_status = ev.is_online;
        } else {
            break;
        }
    }

    let mut cur_ts = window_start;
    let mut online = 0i64;

    for ev in events {
        if ev.ts <= window_start {
            continue;
        }
        if ev.ts >= window_end {
            break;
        }

        let dur = ev.ts - cur_ts;
        if dur > 0 && cur_status {
            online += dur;
        }

        cur_status = ev.is_online;
        cur_ts = ev.ts;
    }

    if cur_ts < window_end && cur_status {
        online += window_end - cur_ts;
    }

    let total = window_end - window_start;
    if total <= 0 {
        return None;
    }

    Some(online as f64 / total as f64)
}
