//! Timing tests for the rate-limited dispatcher

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use svitlo::dispatch::{Dispatcher, RateLimits, Transport, TransportError};
use svitlo::models::Subscriber;
use tokio::time::Instant;

struct NullTransport {
    delivered: Arc<AtomicUsize>,
}

#[async_trait]
impl Transport for NullTransport {
    fn name(&self) -> &str {
        "null"
    }

    async fn deliver(&self, _recipient: &Subscriber, _text: &str) -> Result<(), TransportError> {
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn build(limits: RateLimits) -> (Arc<Dispatcher>, Arc<AtomicUsize>) {
    let delivered = Arc::new(AtomicUsize::new(0));
    let transport = NullTransport {
        delivered: delivered.clone(),
    };
    (Arc::new(Dispatcher::new(transport, limits)), delivered)
}

#[tokio::test(start_paused = true)]
async fn five_sequential_sends_to_one_recipient_take_four_seconds() {
    let limits = RateLimits {
        max_global_per_window: 2.0,
        min_per_recipient_interval: Duration::from_secs(1),
        window: Duration::from_secs(1),
    };
    let (dispatcher, delivered) = build(limits);
    let sub = Subscriber::new(99);

    let started = Instant::now();
    for _ in 0..5 {
        dispatcher.send(&sub, "ping").await;
    }

    assert_eq!(delivered.load(Ordering::SeqCst), 5);
    assert!(
        started.elapsed() >= Duration::from_secs(4),
        "took {:?}",
        started.elapsed()
    );
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_respect_the_global_window() {
    let limits = RateLimits {
        max_global_per_window: 2.0,
        min_per_recipient_interval: Duration::from_millis(1),
        window: Duration::from_secs(1),
    };
    let (dispatcher, delivered) = build(limits);

    let started = Instant::now();
    let mut handles = Vec::new();
    for chat_id in 0..6 {
        let dispatcher = dispatcher.clone();
        handles.push(tokio::spawn(async move {
            dispatcher.send(&Subscriber::new(chat_id), "hi").await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(delivered.load(Ordering::SeqCst), 6);
    // 6 sends through a 2-per-second window need at least 2 extra windows
    assert!(
        started.elapsed() >= Duration::from_secs(2),
        "took {:?}",
        started.elapsed()
    );
}

#[tokio::test(start_paused = true)]
async fn recipient_spacing_does_not_stall_other_recipients() {
    let limits = RateLimits {
        max_global_per_window: 100.0,
        min_per_recipient_interval: Duration::from_secs(30),
        window: Duration::from_secs(1),
    };
    let (dispatcher, delivered) = build(limits);

    // first send to chat 1 stamps its spacing clock
    dispatcher.send(&Subscriber::new(1), "a").await;

    // a second send to chat 1 would wait 30s; unrelated chats must not
    let blocked = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            dispatcher.send(&Subscriber::new(1), "b").await;
        })
    };

    let started = Instant::now();
    for chat_id in 2..10 {
        dispatcher.send(&Subscriber::new(chat_id), "c").await;
    }
    assert!(
        started.elapsed() < Duration::from_secs(1),
        "unrelated sends stalled for {:?}",
        started.elapsed()
    );

    blocked.await.unwrap();
    assert_eq!(delivered.load(Ordering::SeqCst), 10);
}
