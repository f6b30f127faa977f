//! Outbound robot notifications.
//!
//! Proactive messages (provisioning outcomes) go through the chat platform's
//! robot webhook. Sending is best-effort: a failed notification is logged and
//! dropped, never surfaced to the flow that triggered it.

use serde_json::json;

/// Robot webhook sender.
pub struct Notifier {
    webhook_url: Option<String>,
    http: reqwest::Client,
}

impl Notifier {
    /// Build a notifier; `None` disables outbound messages entirely.
    pub fn new(webhook_url: Option<String>) -> Self {
        if webhook_url.is_none() {
            tracing::warn!("No robot webhook configured, notifications disabled");
        }
        Self {
            webhook_url,
            http: reqwest::Client::new(),
        }
    }

    /// Post a plain-text robot message. Best-effort.
    pub async fn send_text(&self, content: &str) {
        let Some(url) = &self.webhook_url else {
            tracing::debug!("Dropping notification, no webhook configured");
            return;
        };

        let payload = json!({
            "msgtype": "text",
            "text": { "content": content },
        });

        match self.http.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!("Robot notification delivered");
            }
            Ok(response) => {
                tracing::warn!(status = %response.status(), "Robot webhook rejected notification");
            }
            Err(error) => {
                tracing::warn!(%error, "Robot notification failed");
            }
        }
    }
}
