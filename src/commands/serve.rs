//! Webhook + metrics server and the schedule watchdog
//!
//! `serve` wires the whole system together: opens the stores, builds the
//! dispatcher and (when configured) the feed client, spawns the watchdog
//! task, and runs the axum server with the status webhook, health check
//! and Prometheus metrics.

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::dispatch::{Dispatcher, TelegramTransport};
use crate::i18n::DEFAULT_LANG;
use crate::metrics;
use crate::schedule::{ScheduleCache, ScheduleClient, ScheduleWatchdog};
use crate::service::{current_ts, StatusService};
use crate::storage::{ChatSettings, EventStore, StateStore, SubscriberStore};

/// Shared state for the web handlers
struct AppContext {
    service: StatusService,
    events: Arc<EventStore>,
    state: StateStore,
    webhook_secret: String,
}

#[derive(Debug, Deserialize)]
struct PowerHookPayload {
    #[serde(default)]
    secret: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    ts: Option<i64>,
}

/// Run the service until interrupted.
pub async fn serve(config: Config) -> Result<()> {
    config.validate()?;

    if config.telegram.bot_token.is_empty() {
        anyhow::bail!("SVITLO_BOT_TOKEN must be set to run the service");
    }

    // the event log is the one store whose failure is fatal
    let db_path = config.storage.db_path();
    let events = Arc::new(
        EventStore::open(&db_path)
            .with_context(|| format!("Failed to open event log at {}", db_path.display()))?,
    );
    let chat_settings = Arc::new(
        ChatSettings::open(&db_path, DEFAULT_LANG)
            .context("Failed to open chat settings table")?,
    );

    let transport = TelegramTransport::new(config.telegram.bot_token.clone())
        .context("Failed to build Telegram transport")?;
    let dispatcher = Arc::new(Dispatcher::new(transport, config.rate_limit.limits()));

    let schedule_client = match config.schedule.feed_target() {
        Some(target) => {
            let client = match &config.schedule.feed_url {
                Some(url) => {
                    ScheduleClient::with_base_url(url, target, config.schedule.request_timeout())
                }
                None => ScheduleClient::new(target, config.schedule.request_timeout()),
            }
            .context("Failed to build schedule feed client")?;
            Some(Arc::new(client))
        }
        None => {
            tracing::info!("schedule feed not configured, watchdog disabled");
            None
        }
    };

    let service = StatusService::new(
        events.clone(),
        StateStore::new(config.storage.state_path()),
        SubscriberStore::new(config.storage.subscribers_path()),
        chat_settings.clone(),
        dispatcher.clone(),
        schedule_client.clone(),
    );

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "metrics initialization failed, continuing without metrics");
    }

    if let Some(client) = schedule_client {
        let watchdog = ScheduleWatchdog::new(
            client,
            ScheduleCache::new(config.storage.schedule_state_path()),
            SubscriberStore::new(config.storage.subscribers_path()),
            chat_settings.clone(),
            dispatcher.clone(),
            config.schedule.poll_interval(),
        );
        tokio::spawn(watchdog.run());
    }

    let context = Arc::new(AppContext {
        service,
        events,
        state: StateStore::new(config.storage.state_path()),
        webhook_secret: config.web.webhook_secret.clone(),
    });

    let app = Router::new()
        .route("/power-hook", post(power_hook_handler))
        .route("/healthz", get(healthz_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(context);

    let addr = format!("{}:{}", config.web.bind_host, config.web.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    tracing::info!(addr = %addr, "webhook server listening");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

async fn power_hook_handler(
    State(context): State<Arc<AppContext>>,
    Json(payload): Json<PowerHookPayload>,
) -> (StatusCode, Json<serde_json::Value>) {
    if payload.secret.as_deref() != Some(context.webhook_secret.as_str()) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"ok": false, "error": "forbidden"})),
        );
    }

    let is_online = match payload.status.as_deref() {
        Some("on") => true,
        Some("off") => false,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"ok": false, "error": "invalid status"})),
            );
        }
    };

    match context.service.apply_status_change(is_online, payload.ts).await {
        Ok(message) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "applied": message.is_some(),
                "message": message,
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "failed to apply status change");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"ok": false, "error": e.to_string()})),
            )
        }
    }
}

async fn healthz_handler(
    State(context): State<Arc<AppContext>>,
) -> (StatusCode, Json<serde_json::Value>) {
    match context.events.count() {
        Ok(count) => (
            StatusCode::OK,
            Json(json!({"ok": true, "events_count": count})),
        ),
        Err(e) => {
            tracing::error!(error = %e, "healthcheck failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"ok": false, "error": e.to_string()})),
            )
        }
    }
}

async fn metrics_handler(State(context): State<Arc<AppContext>>) -> (StatusCode, String) {
    let events = match context.events.list_events() {
        Ok(events) => events,
        Err(e) => {
            tracing::error!(error = %e, "failed to load events for metrics");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new());
        }
    };

    let state = context.state.load();
    metrics::update_from(&events, &state, current_ts());
    (StatusCode::OK, metrics::render())
}
