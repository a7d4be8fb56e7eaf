//! Local-time helpers for day windows and slot anchoring
//!
//! All analytics and schedule math is done in the host's local timezone,
//! mirroring how residents read the utility's timetable. Conversions go
//! through `chrono::Local`; the rare DST gap where a local midnight does
//! not exist resolves to the earliest valid instant.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// Epoch seconds of local midnight at the start of `day`.
pub fn local_midnight_ts(day: NaiveDate) -> Option<i64> {
    naive_local_ts(day.and_time(NaiveTime::MIN))
}

/// Epoch seconds of a naive local datetime.
pub fn naive_local_ts(dt: NaiveDateTime) -> Option<i64> {
    match Local.from_local_datetime(&dt) {
        chrono::LocalResult::Single(resolved) => Some(resolved.timestamp()),
        chrono::LocalResult::Ambiguous(earliest, _) => Some(earliest.timestamp()),
        // DST gap: shift forward until the wall clock exists again
        chrono::LocalResult::None => Local
            .from_local_datetime(&(dt + chrono::Duration::hours(1)))
            .earliest()
            .map(|resolved| resolved.timestamp()),
    }
}

/// `[local midnight, next local midnight)` of `day` as epoch seconds.
pub fn day_window(day: NaiveDate) -> Option<(i64, i64)> {
    let start = local_midnight_ts(day)?;
    let end = local_midnight_ts(day.succ_opt()?)?;
    Some((start, end))
}

/// Local calendar date containing the given epoch second.
pub fn local_date_of(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.with_timezone(&Local).date_naive())
}

/// Format an epoch second as local `HH:MM`.
pub fn format_local_hm(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// Format an epoch second as local `YYYY-MM-DD HH:MM:SS`.
pub fn format_local_datetime(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| {
            dt.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_default()
}

/// Format a date as `DD.MM.YYYY`, the way the timetable prints dates.
pub fn format_date_dmy(day: NaiveDate) -> String {
    format!("{:02}.{:02}.{}", day.day(), day.month(), day.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_window_spans_a_day() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let (start, end) = day_window(day).unwrap();
        // 24h on regular days; DST transition days may differ by an hour
        assert!(end - start >= 23 * 3600 && end - start <= 25 * 3600);
    }

    #[test]
    fn test_local_date_roundtrip() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let midnight = local_midnight_ts(day).unwrap();
        assert_eq!(local_date_of(midnight), Some(day));
        assert_eq!(local_date_of(midnight + 3600), Some(day));
    }

    #[test]
    fn test_format_date_dmy() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(format_date_dmy(day), "05.01.2025");
    }
}
