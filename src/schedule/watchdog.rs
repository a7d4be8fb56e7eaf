//! Periodic schedule poll with change-gated notifications
//!
//! One task runs the cycle strictly sequentially: fetch, normalize, diff
//! against the cache, persist, notify, sleep. A failing cycle is logged
//! and swallowed; the cache is left untouched on fetch failure so the
//! next successful poll diffs against the last good state.

use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use std::time::Duration;

use super::cache::{update_day_schedule, ScheduleCache};
use super::normalize::slots_for_day;
use super::{ScheduleClient, ScheduleSlot};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::i18n::t;
use crate::service::current_ts;
use crate::storage::{ChatSettings, SubscriberStore};
use crate::utils::time::{format_date_dmy, format_local_hm, local_date_of};

/// Background poller for the outage-schedule feed.
pub struct ScheduleWatchdog {
    client: Arc<ScheduleClient>,
    cache: ScheduleCache,
    subscribers: SubscriberStore,
    chat_settings: Arc<ChatSettings>,
    dispatcher: Arc<Dispatcher>,
    poll_interval: Duration,
}

impl ScheduleWatchdog {
    pub fn new(
        client: Arc<ScheduleClient>,
        cache: ScheduleCache,
        subscribers: SubscriberStore,
        chat_settings: Arc<ChatSettings>,
        dispatcher: Arc<Dispatcher>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            cache,
            subscribers,
            chat_settings,
            dispatcher,
            poll_interval,
        }
    }

    /// Run the poll loop forever. Cycle failures are never fatal.
    pub async fn run(self) {
        tracing::info!(
            group = %self.client.group(),
            interval_secs = self.poll_interval.as_secs(),
            "schedule watchdog started"
        );

        loop {
            if let Err(e) = self.cycle(current_ts()).await {
                tracing::warn!(error = %e, "schedule watchdog cycle failed");
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// One poll cycle: fetch, diff today and tomorrow, persist, notify.
    pub async fn cycle(&self, now_ts: i64) -> Result<()> {
        let Some(today) = local_date_of(now_ts) else {
            return Ok(());
        };
        let tomorrow = today + ChronoDuration::days(1);

        // fetch failure leaves the cache untouched; the next good poll
        // diffs against the last known state
        let slots = match self.client.group_slots().await {
            Ok(slots) => slots,
            Err(e) => {
                tracing::warn!(error = %e, "schedule feed fetch failed, keeping cached timetable");
                return Ok(());
            }
        };

        let slots_today = slots_for_day(&slots, today, 0);
        let slots_tomorrow = slots_for_day(&slots, today, 1);

        let mut state = self.cache.load();
        let changed_today = update_day_schedule(&mut state, today, &slots_today, now_ts);
        let changed_tomorrow = update_day_schedule(&mut state, tomorrow, &slots_tomorrow, now_ts);
        state.last_check_ts = Some(now_ts);
        self.cache.save(&state)?;

        if !changed_today && !changed_tomorrow {
            return Ok(());
        }

        tracing::info!(
            changed_today,
            changed_tomorrow,
            today_slots = slots_today.len(),
            tomorrow_slots = slots_tomorrow.len(),
            "timetable changed"
        );

        let subscribers = self.subscribers.load();
        if subscribers.is_empty() {
            return Ok(());
        }

        for sub in &subscribers {
            let lang = self.chat_settings.lang_for_chat(sub.chat_id, sub.thread_id);
            let msg = render_change_message(
                &lang,
                self.client.group().as_str(),
                today,
                changed_today.then_some(&slots_today[..]),
                tomorrow,
                (changed_tomorrow && !slots_tomorrow.is_empty()).then_some(&slots_tomorrow[..]),
            );

            if let Some(msg) = msg {
                self.dispatcher.send(sub, &msg).await;
            }
        }

        Ok(())
    }
}

fn slot_line(slot: &ScheduleSlot, lang: &str) -> String {
    t!(
        "watch.slot_line",
        locale = lang,
        prefix = slot.status.prefix(),
        start = format_local_hm(slot.start_ts),
        end = format_local_hm(slot.end_ts),
        title = &slot.title
    )
    .to_string()
}

/// Build one combined message covering every changed day, or None when
/// there is nothing to say.
fn render_change_message(
    lang: &str,
    group: &str,
    today: chrono::NaiveDate,
    today_block: Option<&[ScheduleSlot]>,
    tomorrow: chrono::NaiveDate,
    tomorrow_block: Option<&[ScheduleSlot]>,
) -> Option<String> {
    let mut lines: Vec<String> = Vec::new();

    if let Some(slots) = today_block {
        lines.push(
            t!(
                "watch.today.header",
                locale = lang,
                date = format_date_dmy(today)
            )
            .to_string(),
        );
        lines.push(t!("watch.group", locale = lang, group = group).to_string());
        lines.push(String::new());

        if slots.is_empty() {
            lines.push(t!("watch.today.empty", locale = lang).to_string());
        } else {
            for slot in slots {
                lines.push(slot_line(slot, lang));
            }
        }
    }

    if let Some(slots) = tomorrow_block {
        if !lines.is_empty() {
            lines.push(String::new());
        }

        lines.push(
            t!(
                "watch.tomorrow.header",
                locale = lang,
                date = format_date_dmy(tomorrow)
            )
            .to_string(),
        );
        lines.push(t!("watch.group", locale = lang, group = group).to_string());
        lines.push(String::new());

        for slot in slots {
            lines.push(slot_line(slot, lang));
        }
    }

    if lines.is_empty() {
        return None;
    }
    Some(lines.join("\n"))
}
