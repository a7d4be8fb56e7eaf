//! Watchdog poll-cycle tests: change gating and feed-failure handling

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use svitlo::dispatch::{Dispatcher, RateLimits, Transport, TransportError};
use svitlo::models::Subscriber;
use svitlo::schedule::client::FeedTarget;
use svitlo::schedule::{Group, ScheduleCache, ScheduleClient, ScheduleWatchdog};
use svitlo::storage::{ChatSettings, SubscriberStore};
use svitlo::utils::time::local_midnight_ts;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct RecordingTransport {
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Transport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn deliver(&self, _recipient: &Subscriber, text: &str) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

fn feed_body() -> serde_json::Value {
    serde_json::json!({
        "1.1": {
            "today": {
                "date": "2025-11-28T00:00:00",
                "status": "ScheduleApplies",
                "slots": [{"start": 600, "end": 780, "type": "Definite"}]
            },
            "tomorrow": {
                "date": "2025-11-29T00:00:00",
                "status": "ScheduleApplies",
                "slots": [{"start": 300, "end": 420, "type": "Definite"}]
            }
        }
    })
}

struct Rig {
    watchdog: ScheduleWatchdog,
    cache_path: std::path::PathBuf,
    sent: Arc<Mutex<Vec<String>>>,
    now_ts: i64,
    _dir: tempfile::TempDir,
}

fn rig(server: &MockServer) -> Rig {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("schedule_state.json");

    let client = ScheduleClient::with_base_url(
        &server.uri(),
        FeedTarget {
            region_id: 25,
            dso_id: 902,
            group: Group::G1_1,
        },
        Duration::from_secs(2),
    )
    .unwrap();

    let sub_store = SubscriberStore::new(dir.path().join("subscribers.json"));
    sub_store.save(&[Subscriber::new(1), Subscriber::new(2)]).unwrap();

    let sent = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = Arc::new(Dispatcher::new(
        RecordingTransport { sent: sent.clone() },
        RateLimits {
            max_global_per_window: 1000.0,
            min_per_recipient_interval: Duration::ZERO,
            window: Duration::from_secs(1),
        },
    ));

    let watchdog = ScheduleWatchdog::new(
        Arc::new(client),
        ScheduleCache::new(&cache_path),
        sub_store,
        Arc::new(ChatSettings::open_in_memory("uk").unwrap()),
        dispatcher,
        Duration::from_secs(900),
    );

    // noon on the feed's "today"
    let day = NaiveDate::from_ymd_opt(2025, 11, 28).unwrap();
    let now_ts = local_midnight_ts(day).unwrap() + 12 * 3600;

    Rig {
        watchdog,
        cache_path,
        sent,
        now_ts,
        _dir: dir,
    }
}

#[tokio::test]
async fn first_poll_notifies_and_unchanged_repoll_stays_silent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/regions/25/dsos/902/planned-outages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body()))
        .mount(&server)
        .await;

    let rig = rig(&server);

    rig.watchdog.cycle(rig.now_ts).await.unwrap();
    // one combined message per subscriber
    assert_eq!(rig.sent.lock().unwrap().len(), 2);
    let msg = rig.sent.lock().unwrap()[0].clone();
    assert!(msg.contains("28.11.2025"));
    assert!(msg.contains("29.11.2025"));

    // identical feed content: cache comparison gates the notification
    rig.watchdog.cycle(rig.now_ts + 60).await.unwrap();
    assert_eq!(rig.sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn fetch_failure_leaves_cache_untouched_and_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/regions/25/dsos/902/planned-outages"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let rig = rig(&server);

    rig.watchdog.cycle(rig.now_ts).await.unwrap();
    assert!(rig.sent.lock().unwrap().is_empty());
    assert!(!rig.cache_path.exists(), "failed poll must not write the cache");
}
