//! Fire-and-forget event notifications.
//!
//! State-mutating operations hand events to a [`Notifier`], which enqueues
//! them on an unbounded channel and returns immediately. A background worker
//! drains the channel and delivers each event through a [`WebhookSender`].
//! Delivery failures are logged and dropped; they never reach the caller and
//! are never retried.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::{future::Future, pin::Pin, sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Critical,
}

impl Severity {
    /// Embed color for the notification channel.
    #[must_use]
    pub const fn color(self) -> u32 {
        match self {
            Self::Info => 3_447_003,
            Self::Success => 3_066_993,
            Self::Warning => 16_776_960,
            Self::Critical => 15_158_332,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub severity: Severity,
}

/// Delivery abstraction used by the notification worker.
pub trait WebhookSender: Send + Sync {
    fn send<'a>(
        &'a self,
        notification: &'a Notification,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Posts Discord-compatible embeds to a configured webhook URL.
pub struct HttpWebhookSender {
    url: SecretString,
    client: Client,
}

impl HttpWebhookSender {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: SecretString) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .context("failed to build webhook HTTP client")?;

        Ok(Self { url, client })
    }
}

impl WebhookSender for HttpWebhookSender {
    fn send<'a>(
        &'a self,
        notification: &'a Notification,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let payload = json!({
                "embeds": [{
                    "title": notification.title,
                    "description": notification.body,
                    "color": notification.severity.color(),
                    "timestamp": Utc::now().to_rfc3339(),
                }]
            });

            let response = self
                .client
                .post(self.url.expose_secret())
                .json(&payload)
                .send()
                .await
                .context("webhook request failed")?;

            if !response.status().is_success() {
                bail!("webhook delivery failed: {}", response.status());
            }

            Ok(())
        })
    }
}

/// Local dev sender that logs the event instead of delivering it.
#[derive(Clone, Debug)]
pub struct LogWebhookSender;

impl WebhookSender for LogWebhookSender {
    fn send<'a>(
        &'a self,
        notification: &'a Notification,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            info!(
                title = %notification.title,
                body = %notification.body,
                severity = ?notification.severity,
                "notification webhook send stub"
            );
            Ok(())
        })
    }
}

/// Cheap clonable handle for emitting events.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Enqueue an event. Never blocks and never fails the caller; a closed
    /// channel only drops the event with a debug log.
    pub fn emit(&self, title: impl Into<String>, body: impl Into<String>, severity: Severity) {
        let notification = Notification {
            title: title.into(),
            body: body.into(),
            severity,
        };
        if self.tx.send(notification).is_err() {
            debug!("notification channel closed, event dropped");
        }
    }
}

/// Create a notifier and the receiving end of its queue.
#[must_use]
pub fn channel() -> (Notifier, mpsc::UnboundedReceiver<Notification>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier { tx }, rx)
}

/// Spawn the background task that drains the queue through `sender`.
pub fn spawn_worker(sender: Arc<dyn WebhookSender>) -> (Notifier, tokio::task::JoinHandle<()>) {
    let (notifier, mut rx) = channel();
    let handle = tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            if let Err(err) = sender.send(&notification).await {
                error!(title = %notification.title, "notification delivery failed: {err}");
            }
        }
    });
    (notifier, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn severity_colors_match_channel_palette() {
        assert_eq!(Severity::Info.color(), 3_447_003);
        assert_eq!(Severity::Success.color(), 3_066_993);
        assert_eq!(Severity::Critical.color(), 15_158_332);
    }

    #[tokio::test]
    async fn emit_enqueues_notification() {
        let (notifier, mut rx) = channel();
        notifier.emit("title", "body", Severity::Info);

        let notification = rx.recv().await;
        assert!(
            matches!(notification, Some(event) if event.title == "title" && event.severity == Severity::Info)
        );
    }

    #[tokio::test]
    async fn emit_survives_closed_channel() {
        let (notifier, rx) = channel();
        drop(rx);
        // Must not panic or error.
        notifier.emit("title", "body", Severity::Warning);
    }

    #[tokio::test]
    async fn http_sender_posts_embed() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(serde_json::json!({
                "embeds": [{"title": "🚫 User Banned", "color": 15_158_332}]
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let sender = HttpWebhookSender::new(SecretString::from(format!("{}/hook", server.uri())))?;
        let notification = Notification {
            title: "🚫 User Banned".to_string(),
            body: "ID: u1".to_string(),
            severity: Severity::Critical,
        };
        sender.send(&notification).await?;
        Ok(())
    }

    #[tokio::test]
    async fn http_sender_reports_failure_status() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let sender = HttpWebhookSender::new(SecretString::from(server.uri()))?;
        let notification = Notification {
            title: "title".to_string(),
            body: "body".to_string(),
            severity: Severity::Info,
        };
        assert!(sender.send(&notification).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn worker_swallows_delivery_failures() {
        // A sender that always fails must not take the worker down.
        struct FailingSender;
        impl WebhookSender for FailingSender {
            fn send<'a>(
                &'a self,
                _notification: &'a Notification,
            ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
                Box::pin(async { bail!("always down") })
            }
        }

        let (notifier, handle) = spawn_worker(Arc::new(FailingSender));
        notifier.emit("first", "body", Severity::Info);
        notifier.emit("second", "body", Severity::Info);
        drop(notifier);

        // Worker exits cleanly once all senders are gone.
        handle.await.expect("worker task panicked");
    }
}
