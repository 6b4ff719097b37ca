//! Slack webhook notifier
//!
//! Posts publish outcomes to a Slack incoming webhook. When no webhook is
//! configured the notifier is an informational no-op; when delivery fails
//! the error propagates to the caller without retry.

use crate::core::error::PipelineError;
use crate::core::traits::Notifier;
use async_trait::async_trait;
use serde::Serialize;

/// Incoming-webhook message body
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WebhookPayload<'a> {
    pub text: &'a str,
}

/// Notifier backed by a Slack incoming webhook
pub struct SlackNotifier {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, message: &str) -> Result<(), PipelineError> {
        let Some(url) = &self.webhook_url else {
            println!("No webhook available for Slack notification.");
            return Ok(());
        };

        println!("Notifying Slack.");

        let response = self
            .client
            .post(url)
            .json(&WebhookPayload { text: message })
            .send()
            .await
            .map_err(|e| PipelineError::NotificationFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::NotificationFailed(format!(
                "webhook responded with HTTP {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_notifier_is_noop() {
        let notifier = SlackNotifier::new(None);
        let result = notifier.notify("hello").await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_payload_shape() {
        let payload = WebhookPayload { text: "Successfully published." };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"text":"Successfully published."}"#);
    }

    #[tokio::test]
    async fn test_unreachable_webhook_propagates_error() {
        // The .invalid TLD never resolves, so delivery fails fast.
        let notifier = SlackNotifier::new(Some("http://webhook.invalid/hook".to_string()));
        let result = notifier.notify("hello").await;

        assert!(matches!(
            result,
            Err(PipelineError::NotificationFailed(_))
        ));
    }
}
