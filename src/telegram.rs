use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

/// Anything that can deliver a rendered message to a chat destination.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: Option<&'static str>,
    ) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

/// Minimal Telegram Bot API client for `sendMessage`
pub struct TelegramClient {
    client: reqwest::Client,
    api_base_url: String,
    bot_token: Option<String>,
}

impl TelegramClient {
    pub fn new(
        api_base_url: &str,
        bot_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Telegram HTTP client")?;
        Ok(Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            bot_token,
        })
    }
}

#[async_trait]
impl ChatSender for TelegramClient {
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: Option<&'static str>,
    ) -> Result<()> {
        let token = self
            .bot_token
            .as_deref()
            .context("Telegram bot token is not configured")?;

        let url = format!("{}/bot{}/sendMessage", self.api_base_url, token);
        let request = SendMessageRequest {
            chat_id,
            text,
            disable_web_page_preview: true,
            parse_mode,
        };

        debug!("Sending Telegram message to chat {}", chat_id);

        // The URL embeds the token, so keep it out of error messages.
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("Failed to send Telegram message to {}", chat_id))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Telegram API error for {} ({}): {}", chat_id, status, error_body);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, token: Option<&str>) -> TelegramClient {
        TelegramClient::new(
            &server.uri(),
            token.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_message_wire_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(json!({
                "chat_id": "-100123",
                "text": "hello \\.",
                "disable_web_page_preview": true,
                "parse_mode": "MarkdownV2",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server, Some("123:abc"))
            .send_message("-100123", "hello \\.", Some("MarkdownV2"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_plain_mode_omits_parse_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bottok/sendMessage"))
            .and(body_json(json!({
                "chat_id": "@alerts",
                "text": "plain",
                "disable_web_page_preview": true,
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client(&server, Some("tok"))
            .send_message("@alerts", "plain", None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string("Bad Request: chat not found"),
            )
            .mount(&server)
            .await;

        let err = client(&server, Some("tok"))
            .send_message("D1", "x", None)
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("400"), "{err}");
        assert!(err.contains("chat not found"), "{err}");
        assert!(err.contains("D1"), "{err}");
    }

    #[tokio::test]
    async fn test_missing_token_is_error() {
        let server = MockServer::start().await;
        let err = client(&server, None)
            .send_message("D1", "x", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bot token"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
