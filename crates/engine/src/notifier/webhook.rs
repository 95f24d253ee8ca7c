use async_trait::async_trait;
use reqwest::Client;

use responder_common::crypto::sign_payload;

use super::channel::{Notifier, NotifyError, StatusUpdate};

/// Posts status updates to an external webhook, HMAC-signing the body so
/// the receiver can authenticate the sender.
pub struct WebhookNotifier {
    url: String,
    secret: Vec<u8>,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: String, secret: Vec<u8>) -> Self {
        Self {
            url,
            secret,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, update: &StatusUpdate) -> Result<(), NotifyError> {
        let body = serde_json::to_vec(update).map_err(|e| NotifyError(e.to_string()))?;
        let signature = sign_payload(&self.secret, &body);

        self.client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("X-Responder-Signature", &signature)
            .body(body)
            .send()
            .await
            .map_err(|e| NotifyError(e.to_string()))?
            .error_for_status()
            .map_err(|e| NotifyError(e.to_string()))?;

        Ok(())
    }
}
