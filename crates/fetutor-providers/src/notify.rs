//! Report notifiers.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, instrument};

use fetutor_core::error::NotifyError;
use fetutor_core::traits::{Notification, Notifier};

const WEBHOOK_TIMEOUT_SECS: u64 = 15;

/// Posts each notification as JSON `{to, subject, body}` to a webhook.
pub struct WebhookNotifier {
    url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: &str, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            url: url.to_string(),
            token,
            client,
        }
    }
}

impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookNotifier")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    #[instrument(skip(self, notification), fields(subject = %notification.subject))]
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        if self.url.trim().is_empty() {
            return Err(NotifyError::NotConfigured("webhook url is empty".into()));
        }

        let mut req = self.client.post(&self.url).json(notification);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let response = req
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, message });
        }
        Ok(())
    }
}

/// Writes notifications to the log instead of sending them anywhere.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            to = %notification.to,
            subject = %notification.subject,
            bytes = notification.body.len(),
            "notification"
        );
        Ok(())
    }
}

/// Records notifications; optionally fails every send.
#[derive(Debug, Default)]
pub struct MockNotifier {
    fail: bool,
    sent: Mutex<Vec<Notification>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every send fails with a transport error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Transport("mock transport failure".into()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
