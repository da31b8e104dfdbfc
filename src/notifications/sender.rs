use crate::config::NotificationConfig;
use crate::error::Result;
use crate::metrics::{DISPATCH_FAILURES_TOTAL, NOTIFICATIONS_SENT_TOTAL};
use crate::models::NotificationChannel;
use crate::notifications::slack::SlackSender;
use crate::notifications::webhook::WebhookSender;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// Delivers a rendered message to an endpoint over one channel
#[async_trait]
pub trait ChannelSender: Send + Sync {
    async fn send(&self, endpoint: &str, message: &str) -> Result<()>;

    /// Get sender name
    fn name(&self) -> &str;
}

/// Logging sink used for channels without a registered transport
#[derive(Debug, Clone, Copy)]
pub struct LogSender {
    channel: NotificationChannel,
}

impl LogSender {
    pub fn new(channel: NotificationChannel) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> NotificationChannel {
        self.channel
    }
}

#[async_trait]
impl ChannelSender for LogSender {
    async fn send(&self, endpoint: &str, message: &str) -> Result<()> {
        info!(
            channel = %self.channel,
            endpoint = %endpoint,
            message = %message,
            "Notification logged"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Routes messages to the sender registered for each channel
pub struct Dispatcher {
    senders: RwLock<HashMap<NotificationChannel, Arc<dyn ChannelSender>>>,
}

impl Dispatcher {
    /// Dispatcher with webhook and Slack transports; other channels are logged
    pub fn new(config: &NotificationConfig) -> Result<Self> {
        let dispatcher = Self::logging_only();

        let webhook = WebhookSender::new(config.webhook_timeout_secs, &config.user_agent)?;
        let slack = SlackSender::new(config.webhook_timeout_secs, &config.user_agent)?;

        dispatcher.register(NotificationChannel::Webhook, Arc::new(webhook));
        dispatcher.register(NotificationChannel::Slack, Arc::new(slack));

        Ok(dispatcher)
    }

    /// Dispatcher that logs every message
    pub fn logging_only() -> Self {
        Self {
            senders: RwLock::new(HashMap::new()),
        }
    }

    /// Register (or replace) the sender for a channel
    pub fn register(&self, channel: NotificationChannel, sender: Arc<dyn ChannelSender>) {
        self.senders.write().insert(channel, sender);
    }

    fn sender_for(&self, channel: NotificationChannel) -> Arc<dyn ChannelSender> {
        self.senders
            .read()
            .get(&channel)
            .cloned()
            .unwrap_or_else(|| Arc::new(LogSender::new(channel)))
    }

    /// Send one message. Failures are logged and counted, then returned to
    /// the caller, which never retries.
    pub async fn dispatch(
        &self,
        channel: NotificationChannel,
        endpoint: &str,
        message: &str,
    ) -> Result<()> {
        let sender = self.sender_for(channel);
        let channel_label = channel.to_string();

        match sender.send(endpoint, message).await {
            Ok(()) => {
                NOTIFICATIONS_SENT_TOTAL
                    .with_label_values(&[&channel_label])
                    .inc();
                Ok(())
            }
            Err(e) => {
                DISPATCH_FAILURES_TOTAL
                    .with_label_values(&[&channel_label])
                    .inc();
                error!(
                    channel = %channel_label,
                    sender = sender.name(),
                    endpoint = %endpoint,
                    error = %e,
                    "Dispatch failed"
                );
                Err(e)
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::logging_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ChannelSender for Recorder {
        async fn send(&self, endpoint: &str, message: &str) -> Result<()> {
            self.sent.lock().push((endpoint.to_string(), message.to_string()));
            Ok(())
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    struct Failing;

    #[async_trait]
    impl ChannelSender for Failing {
        async fn send(&self, _endpoint: &str, _message: &str) -> Result<()> {
            Err(AppError::Network("connection refused".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_registered_sender_used() {
        let dispatcher = Dispatcher::logging_only();
        let recorder = Arc::new(Recorder::default());
        dispatcher.register(NotificationChannel::Email, recorder.clone());

        dispatcher
            .dispatch(NotificationChannel::Email, "noc@example.com", "hello")
            .await
            .unwrap();
        dispatcher
            .dispatch(NotificationChannel::Pagerduty, "svc-1", "logged only")
            .await
            .unwrap();

        let sent = recorder.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], ("noc@example.com".to_string(), "hello".to_string()));
    }

    /// Collects formatted log output in memory
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_unregistered_channel_logged_with_channel() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        Dispatcher::logging_only()
            .dispatch(NotificationChannel::Pagerduty, "svc-1", "link down")
            .await
            .unwrap();

        let output = String::from_utf8(logs.0.lock().clone()).unwrap();
        assert!(output.contains("Notification logged"));
        assert!(output.contains("channel=pagerduty"));
        assert!(output.contains("endpoint=svc-1"));
    }

    #[test]
    fn test_log_sender_keeps_channel() {
        let dispatcher = Dispatcher::logging_only();
        assert_eq!(dispatcher.sender_for(NotificationChannel::Email).name(), "log");
        assert_eq!(
            LogSender::new(NotificationChannel::Custom).channel(),
            NotificationChannel::Custom
        );
    }

    #[tokio::test]
    async fn test_failure_returned() {
        let dispatcher = Dispatcher::logging_only();
        dispatcher.register(NotificationChannel::Webhook, Arc::new(Failing));

        let result = dispatcher
            .dispatch(NotificationChannel::Webhook, "http://x", "m")
            .await;
        assert!(matches!(result, Err(AppError::Network(_))));
    }
}
