use crate::error::{AppError, Result};
use crate::notifications::sender::ChannelSender;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Slack incoming-webhook sender
#[derive(Clone)]
pub struct SlackSender {
    pub(crate) client: Client,
    user_agent: String,
}

#[derive(Debug, Serialize)]
struct SlackWebhookPayload<'a> {
    text: &'a str,
}

impl SlackSender {
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
        })
    }
}

#[async_trait]
impl ChannelSender for SlackSender {
    async fn send(&self, endpoint: &str, message: &str) -> Result<()> {
        if endpoint.is_empty() {
            return Err(AppError::Validation("Slack webhook URL is empty".to_string()));
        }

        let response = self
            .client
            .post(endpoint)
            .header("User-Agent", &self.user_agent)
            .json(&SlackWebhookPayload { text: message })
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Failed to send Slack webhook: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Dispatch {
                channel: "slack".to_string(),
                message: format!("status {}: {}", status, body),
            });
        }

        info!(endpoint = %endpoint, "Slack notification sent");
        Ok(())
    }

    fn name(&self) -> &str {
        "slack"
    }
}
