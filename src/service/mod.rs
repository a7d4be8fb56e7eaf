//! Status-change orchestration
//!
//! Glue between the webhook, the stores, the analytics and the
//! dispatcher: record a status observation, ignore no-op transitions,
//! and fan out a localized notification per subscriber.

use std::sync::Arc;

use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::i18n::t;
use crate::schedule::{OutageStatus, ScheduleClient};
use crate::storage::{ChatSettings, EventStore, StateStore, SubscriberStore};
use crate::utils::format::format_duration;
use crate::utils::time::{format_local_datetime, format_local_hm};

/// Orchestrates everything that happens on a grid status change.
pub struct StatusService {
    events: Arc<EventStore>,
    state: StateStore,
    subscribers: SubscriberStore,
    chat_settings: Arc<ChatSettings>,
    dispatcher: Arc<Dispatcher>,
    schedule: Option<Arc<ScheduleClient>>,
}

impl StatusService {
    pub fn new(
        events: Arc<EventStore>,
        state: StateStore,
        subscribers: SubscriberStore,
        chat_settings: Arc<ChatSettings>,
        dispatcher: Arc<Dispatcher>,
        schedule: Option<Arc<ScheduleClient>>,
    ) -> Self {
        Self {
            events,
            state,
            subscribers,
            chat_settings,
            dispatcher,
            schedule,
        }
    }

    /// Apply a newly observed grid status.
    ///
    /// Idempotent: a status equal to the last recorded one is a no-op
    /// with no event logged and no notification sent. Returns the first
    /// rendered message body when notifications went out.
    pub async fn apply_status_change(
        &self,
        is_online: bool,
        now_ts: Option<i64>,
    ) -> Result<Option<String>> {
        let now_ts = now_ts.unwrap_or_else(current_ts);

        let mut state = self.state.load();
        let last_status = state.last_status;
        let last_change_ts = state.last_change_ts;

        // first observation just seeds the state, silently
        let Some(last_status) = last_status else {
            state.apply(is_online, now_ts);
            self.state.save(&state)?;
            self.events.append(now_ts, is_online)?;
            tracing::info!(is_online, "initialized grid state");
            return Ok(None);
        };

        if is_online == last_status {
            tracing::debug!(is_online, "status unchanged, ignoring");
            return Ok(None);
        }

        // duration of the outage that just ended (off -> on)
        let outage_seconds = match (last_status, is_online, last_change_ts) {
            (false, true, Some(changed)) => Some((now_ts - changed).max(0)),
            _ => None,
        };

        state.apply(is_online, now_ts);
        self.state.save(&state)?;
        self.events.append(now_ts, is_online)?;

        let subscribers = self.subscribers.load();
        if subscribers.is_empty() {
            tracing::info!(is_online, "status changed but there are no subscribers");
            return Ok(None);
        }

        // one feed lookup shared by every recipient
        let prediction = match (&self.schedule, is_online) {
            (Some(client), false) => client.predict_on_time(now_ts).await,
            _ => None,
        };

        let now_str = format_local_datetime(now_ts);
        let mut first_msg: Option<String> = None;

        for sub in &subscribers {
            let lang = self.chat_settings.lang_for_chat(sub.chat_id, sub.thread_id);
            let msg = self.render_status_message(
                is_online,
                &now_str,
                outage_seconds,
                prediction,
                &lang,
            );

            if first_msg.is_none() {
                first_msg = Some(msg.clone());
            }

            self.dispatcher.send(sub, &msg).await;
        }

        Ok(first_msg)
    }

    fn render_status_message(
        &self,
        is_online: bool,
        now_str: &str,
        outage_seconds: Option<i64>,
        prediction: Option<(i64, OutageStatus)>,
        lang: &str,
    ) -> String {
        let mut lines = Vec::new();

        if is_online {
            lines.push(t!("notify.online.title", locale = lang).to_string());
        } else {
            lines.push(t!("notify.offline.title", locale = lang).to_string());
        }

        lines.push(t!("notify.timestamp", locale = lang, ts = now_str).to_string());

        if let Some(seconds) = outage_seconds.filter(|&s| s > 0) {
            let duration = format_duration(seconds, lang);
            lines.push(t!("notify.outage_duration", locale = lang, duration = duration).to_string());
        }

        if !is_online {
            match (prediction, &self.schedule) {
                (Some((eta_ts, status)), Some(client)) => {
                    lines.push(
                        t!(
                            "notify.predicted_on",
                            locale = lang,
                            group = client.group().as_str(),
                            kind = status.kind_label(lang),
                            eta = format_local_hm(eta_ts)
                        )
                        .to_string(),
                    );
                }
                _ => {
                    lines.push(t!("notify.no_schedule_data", locale = lang).to_string());
                }
            }
        }

        lines.join("\n")
    }
}

/// Current epoch seconds.
pub fn current_ts() -> i64 {
    chrono::Utc::now().timestamp()
}
