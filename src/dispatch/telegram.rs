//! Telegram Bot API transport

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::{Transport, TransportError};
use crate::models::Subscriber;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Serialize)]
struct SendMessagePayload<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
}

/// Sends messages through the Telegram Bot API, addressing forum threads
/// when the subscriber carries a thread id.
pub struct TelegramTransport {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl TelegramTransport {
    pub fn new(token: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_api_base(DEFAULT_API_BASE, token)
    }

    /// Point the transport at a custom API host (tests, local proxies).
    pub fn with_api_base(
        api_base: &str,
        token: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let token = token.into();
        if token.is_empty() {
            return Err(TransportError::InvalidConfig(
                "bot token must not be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn deliver(&self, recipient: &Subscriber, text: &str) -> Result<(), TransportError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let payload = SendMessagePayload {
            chat_id: recipient.chat_id,
            text,
            message_thread_id: recipient.thread_id,
        };

        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_rejected() {
        assert!(matches!(
            TelegramTransport::new(""),
            Err(TransportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_payload_skips_absent_thread_id() {
        let payload = SendMessagePayload {
            chat_id: 42,
            text: "hello",
            message_thread_id: None,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("message_thread_id"));

        let payload = SendMessagePayload {
            chat_id: 42,
            text: "hello",
            message_thread_id: Some(7),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"message_thread_id\":7"));
    }
}
