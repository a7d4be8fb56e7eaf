//! Rate-limited notification dispatcher
//!
//! One dispatcher instance owns all outbound-send bookkeeping: a sliding
//! window of recent global send instants plus a per-recipient last-send
//! map. Every send funnels through a single exclusive section, so the
//! dispatcher never exceeds the global cap or the per-recipient spacing
//! regardless of caller concurrency. Waiting releases the section, so a
//! throttled recipient does not stall unrelated sends.
//!
//! This is a sliding-window counter with strict per-key spacing, not a
//! token bucket: there is no burst credit beyond the window size.
//!
//! Delivery failures are logged and swallowed, and the send is still
//! counted against both limits, so a flapping transport cannot grow a
//! backlog or break the rate contract on recovery.

pub mod telegram;

pub use telegram::TelegramTransport;

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::models::Subscriber;

/// Errors raised by a message transport
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The messaging API answered with a non-success status
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Transport-specific configuration problem
    #[error("Invalid transport configuration: {0}")]
    InvalidConfig(String),
}

/// Delivery backend behind the dispatcher.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name for logging
    fn name(&self) -> &str;

    /// Deliver one message to one recipient.
    async fn deliver(&self, recipient: &Subscriber, text: &str) -> Result<(), TransportError>;
}

/// Dispatcher rate limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimits {
    /// Maximum sends inside one sliding window
    pub max_global_per_window: f64,
    /// Minimum spacing between sends to the same recipient
    pub min_per_recipient_interval: Duration,
    /// Sliding window length
    pub window: Duration,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            max_global_per_window: 25.0,
            min_per_recipient_interval: Duration::from_secs(1),
            window: Duration::from_secs(1),
        }
    }
}

/// Send bookkeeping guarded by the dispatcher's exclusive section.
///
/// `last_recipient_send` keeps one entry per distinct recipient for the
/// process lifetime; the subscriber set is small enough that no eviction
/// is done here.
#[derive(Default)]
struct DispatchState {
    recent_sends: VecDeque<Instant>,
    last_recipient_send: HashMap<i64, Instant>,
}

/// Rate-gated serializer in front of a message transport.
pub struct Dispatcher {
    transport: Box<dyn Transport>,
    limits: RateLimits,
    state: Mutex<DispatchState>,
}

impl Dispatcher {
    pub fn new(transport: impl Transport + 'static, limits: RateLimits) -> Self {
        Self {
            transport: Box::new(transport),
            limits,
            state: Mutex::new(DispatchState::default()),
        }
    }

    /// Send one message, blocking until both limits allow it.
    ///
    /// May sleep up to one full window in the worst case; callers must
    /// treat this as a bounded stall. Transport failures are logged and
    /// swallowed; the send still counts against the limits.
    pub async fn send(&self, recipient: &Subscriber, text: &str) {
        loop {
            let mut state = self.state.lock().await;
            let now = Instant::now();

            // 1. evict sends that have left the window
            while let Some(&oldest) = state.recent_sends.front() {
                if now.duration_since(oldest) > self.limits.window {
                    state.recent_sends.pop_front();
                } else {
                    break;
                }
            }

            // 2. per-recipient spacing
            if let Some(&last) = state.last_recipient_send.get(&recipient.chat_id) {
                let elapsed = now.duration_since(last);
                if elapsed < self.limits.min_per_recipient_interval {
                    let wait = self.limits.min_per_recipient_interval - elapsed;
                    drop(state);
                    tokio::time::sleep(wait).await;
                    continue;
                }
            }

            // 3. global sliding-window cap
            if state.recent_sends.len() as f64 >= self.limits.max_global_per_window {
                if let Some(&oldest) = state.recent_sends.front() {
                    let wait = self
                        .limits
                        .window
                        .saturating_sub(now.duration_since(oldest));
                    // an oldest entry exactly at the window edge leaves on
                    // the next eviction pass; only a positive wait re-blocks
                    if !wait.is_zero() {
                        drop(state);
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                }
            }

            // 4. deliver inside the exclusive section, then record
            if let Err(e) = self.transport.deliver(recipient, text).await {
                tracing::warn!(
                    transport = self.transport.name(),
                    recipient = %recipient,
                    error = %e,
                    "message delivery failed"
                );
            }

            let sent_at = Instant::now();
            state.recent_sends.push_back(sent_at);
            state
                .last_recipient_send
                .insert(recipient.chat_id, sent_at);
            return;
        }
    }

    pub fn limits(&self) -> RateLimits {
        self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingTransport {
        delivered: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Transport for CountingTransport {
        fn name(&self) -> &str {
            "counting"
        }

        async fn deliver(&self, _recipient: &Subscriber, _text: &str) -> Result<(), TransportError> {
            self.delivered.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(TransportError::Api {
                    status: 500,
                    body: "boom".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn dispatcher(limits: RateLimits, fail: bool) -> (Dispatcher, Arc<AtomicUsize>) {
        let delivered = Arc::new(AtomicUsize::new(0));
        let transport = CountingTransport {
            delivered: delivered.clone(),
            fail,
        };
        (Dispatcher::new(transport, limits), delivered)
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_recipient_spacing_is_enforced() {
        let limits = RateLimits {
            max_global_per_window: 100.0,
            min_per_recipient_interval: Duration::from_secs(1),
            window: Duration::from_secs(1),
        };
        let (dispatcher, delivered) = dispatcher(limits, false);
        let sub = Subscriber::new(1);

        let started = Instant::now();
        for _ in 0..3 {
            dispatcher.send(&sub, "hi").await;
        }

        assert_eq!(delivered.load(Ordering::SeqCst), 3);
        // 3 sends with 1s spacing need at least 2s
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_recipients_share_only_global_cap() {
        let limits = RateLimits {
            max_global_per_window: 2.0,
            min_per_recipient_interval: Duration::from_secs(10),
            window: Duration::from_secs(1),
        };
        let (dispatcher, delivered) = dispatcher(limits, false);

        let started = Instant::now();
        dispatcher.send(&Subscriber::new(1), "a").await;
        dispatcher.send(&Subscriber::new(2), "b").await;
        // two sends fit inside one window with no waiting
        assert!(started.elapsed() < Duration::from_millis(10));

        dispatcher.send(&Subscriber::new(3), "c").await;
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(delivered.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_delivery_still_counts() {
        let limits = RateLimits {
            max_global_per_window: 1.0,
            min_per_recipient_interval: Duration::from_millis(1),
            window: Duration::from_secs(1),
        };
        let (dispatcher, delivered) = dispatcher(limits, true);

        let started = Instant::now();
        dispatcher.send(&Subscriber::new(1), "a").await;
        dispatcher.send(&Subscriber::new(2), "b").await;

        // the failed first send occupies the window, so the second waits
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(delivered.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_five_sends_same_recipient_take_four_seconds() {
        let limits = RateLimits {
            max_global_per_window: 2.0,
            min_per_recipient_interval: Duration::from_secs(1),
            window: Duration::from_secs(1),
        };
        let (dispatcher, delivered) = dispatcher(limits, false);
        let sub = Subscriber::new(7);

        let started = Instant::now();
        for _ in 0..5 {
            dispatcher.send(&sub, "ping").await;
        }

        assert_eq!(delivered.load(Ordering::SeqCst), 5);
        assert!(started.elapsed() >= Duration::from_secs(4));
    }
}
