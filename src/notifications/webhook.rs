use crate::error::{AppError, Result};
use crate::notifications::sender::ChannelSender;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Webhook notification sender
#[derive(Clone)]
pub struct WebhookSender {
    pub(crate) client: Client,
    pub(crate) timeout_secs: u64,
    user_agent: String,
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    message: &'a str,
}

impl WebhookSender {
    /// Create a new webhook sender
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout_secs,
            user_agent: user_agent.to_string(),
        })
    }

    /// Send HTTP POST request to webhook URL
    async fn send_webhook(&self, url: &str, payload: &WebhookPayload<'_>) -> Result<String> {
        let response = self
            .client
            .post(url)
            .header("User-Agent", &self.user_agent)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(format!(
                        "Webhook request timed out after {} seconds",
                        self.timeout_secs
                    ))
                } else {
                    AppError::Network(format!("Webhook request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(AppError::Dispatch {
                channel: "webhook".to_string(),
                message: format!(
                    "non-success status {}: {}",
                    status,
                    if body.is_empty() { "No response body" } else { body.as_str() }
                ),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl ChannelSender for WebhookSender {
    async fn send(&self, endpoint: &str, message: &str) -> Result<()> {
        if endpoint.is_empty() {
            return Err(AppError::Validation("Webhook endpoint is empty".to_string()));
        }

        let body = self.send_webhook(endpoint, &WebhookPayload { message }).await?;

        info!(
            url = %endpoint,
            response_length = body.len(),
            "Webhook notification sent"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_sender_creation() {
        let sender = WebhookSender::new(10, "alm-engine/test");
        assert!(sender.is_ok());
    }

    #[test]
    fn test_payload_shape() {
        let payload = WebhookPayload { message: "Alarm a-1" };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({"message": "Alarm a-1"})
        );
    }

    #[tokio::test]
    async fn test_posts_message_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Json(serde_json::json!({"message": "linkDown on r1"})))
            .with_status(202)
            .create_async()
            .await;

        let sender = WebhookSender::new(5, "alm-engine/test").unwrap();
        let url = format!("{}/hook", server.url());
        sender.send(&url, "linkDown on r1").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/hook")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let sender = WebhookSender::new(5, "alm-engine/test").unwrap();
        let result = sender.send(&format!("{}/hook", server.url()), "m").await;

        assert!(matches!(result, Err(AppError::Dispatch { .. })));
    }
}
