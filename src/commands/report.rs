//! CLI reports over the event log and the outage timetable

use anyhow::{Context, Result};
use chrono::Duration as ChronoDuration;

use crate::analytics::{
    compute_day_stats, compute_uptime_ratio_window, get_last_transitions, DayStats,
};
use crate::config::Config;
use crate::i18n::{current_locale, t};
use crate::schedule::ScheduleClient;
use crate::service::current_ts;
use crate::storage::{EventStore, StateStore};
use crate::utils::format::format_duration;
use crate::utils::time::{format_date_dmy, format_local_datetime, format_local_hm, local_date_of};

/// Print the current grid status, last transitions and rolling uptime.
pub fn status(config: &Config) -> Result<()> {
    let lang = current_locale();
    let events = open_events(config)?;
    let state = StateStore::new(config.storage.state_path()).load();
    let now_ts = current_ts();

    let status_line = match state.last_status {
        Some(true) => t!("report.status.online", locale = lang).to_string(),
        Some(false) => t!("report.status.offline", locale = lang).to_string(),
        None => t!("report.status.unknown", locale = lang).to_string(),
    };
    match state.last_change_ts {
        Some(ts) => {
            let since = t!("report.since", locale = lang, ts = format_local_datetime(ts));
            println!("{status_line} ({since})");
        }
        None => println!("{status_line}"),
    }

    let (last_off, last_on) = get_last_transitions(&events);
    if let Some(ts) = last_off {
        println!("  off: {}", format_local_datetime(ts));
    }
    if let Some(ts) = last_on {
        println!("  on:  {}", format_local_datetime(ts));
    }

    for (label, window) in [("24h", 24 * 3600), ("7d", 7 * 24 * 3600)] {
        if let Some(ratio) = compute_uptime_ratio_window(&events, window, now_ts) {
            println!("  uptime {label}: {:.1}%", ratio * 100.0);
        }
    }

    Ok(())
}

/// Print per-day availability for the last `days` calendar days.
pub fn today(config: &Config, days: u32) -> Result<()> {
    let lang = current_locale();
    let events = open_events(config)?;
    let now_ts = current_ts();
    let base = local_date_of(now_ts).context("current time out of range")?;

    for i in 0..days.max(1) {
        let day = base - ChronoDuration::days(i64::from(i));
        println!(
            "{}",
            t!("report.day.header", locale = lang, date = format_date_dmy(day))
        );

        match compute_day_stats(day, &events, now_ts) {
            Some(stats) => print_day_stats(&stats, lang),
            None => println!("  {}", t!("report.day.no_data", locale = lang)),
        }
        println!();
    }

    Ok(())
}

fn print_day_stats(stats: &DayStats, lang: &str) {
    println!(
        "  {}",
        t!(
            "report.day.on_total",
            locale = lang,
            duration = format_duration(stats.on_seconds, lang)
        )
    );
    println!(
        "  {}",
        t!(
            "report.day.off_total",
            locale = lang,
            duration = format_duration(stats.off_seconds, lang)
        )
    );
    if let Some(availability) = stats.availability() {
        println!(
            "  {}",
            t!(
                "report.day.availability",
                locale = lang,
                pct = format!("{:.1}", availability * 100.0)
            )
        );
    }

    for outage in &stats.outages {
        match outage.end_ts {
            Some(end) => println!(
                "  {}",
                t!(
                    "report.day.outage_line",
                    locale = lang,
                    start = format_local_hm(outage.start_ts),
                    end = format_local_hm(end)
                )
            ),
            None => println!(
                "  {}",
                t!(
                    "report.day.outage_open",
                    locale = lang,
                    start = format_local_hm(outage.start_ts)
                )
            ),
        }
    }
}

/// Fetch and print the timetable for today or tomorrow.
pub async fn schedule(config: &Config, tomorrow: bool) -> Result<()> {
    let lang = current_locale();
    let target = config
        .schedule
        .feed_target()
        .context("feed region_id, dso_id and group must be configured")?;

    let client = match &config.schedule.feed_url {
        Some(url) => ScheduleClient::with_base_url(url, target, config.schedule.request_timeout()),
        None => ScheduleClient::new(target, config.schedule.request_timeout()),
    }?;

    let now_ts = current_ts();
    let day_offset = i64::from(tomorrow);
    let day = local_date_of(now_ts).context("current time out of range")?
        + ChronoDuration::days(day_offset);

    let slots = client.slots_for_day_offset(now_ts, day_offset).await?;

    let header_key = if tomorrow {
        t!("watch.tomorrow.header", locale = lang, date = format_date_dmy(day))
    } else {
        t!("watch.today.header", locale = lang, date = format_date_dmy(day))
    };
    println!("{header_key}");
    println!(
        "{}",
        t!("watch.group", locale = lang, group = client.group().as_str())
    );

    if slots.is_empty() {
        println!("{}", t!("watch.today.empty", locale = lang));
        return Ok(());
    }

    for slot in &slots {
        println!(
            "{}",
            t!(
                "watch.slot_line",
                locale = lang,
                prefix = slot.status.prefix(),
                start = format_local_hm(slot.start_ts),
                end = format_local_hm(slot.end_ts),
                title = &slot.title
            )
        );
    }

    Ok(())
}

fn open_events(config: &Config) -> Result<Vec<crate::models::PowerEvent>> {
    let db_path = config.storage.db_path();
    let store = EventStore::open(&db_path)
        .with_context(|| format!("Failed to open event log at {}", db_path.display()))?;
    Ok(store.list_events()?)
}
