use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::config::AppConfig;
use crate::{Error, Result};

/// Trait for outbound messaging providers
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Send a plain text message, returning the provider message id
    async fn send_text(&self, to: &str, body: &str) -> Result<String>;

    /// Send an audio message by public link, returning the provider message id
    async fn send_audio(&self, to: &str, link: &str, caption: Option<&str>) -> Result<String>;

    /// Get the gateway name for logging
    fn name(&self) -> &str;
}

/// Messaging gateway backed by the WhatsApp Cloud API
pub struct WhatsAppGateway {
    client: Client,
    base_url: String,
    phone_id: String,
    access_token: String,
}

impl WhatsAppGateway {
    /// Create a new gateway with configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let access_token = config
            .messaging
            .access_token
            .clone()
            .ok_or_else(|| Error::Config("messaging.access_token is not set".to_string()))?;
        let phone_id = config
            .messaging
            .phone_id
            .clone()
            .ok_or_else(|| Error::Config("messaging.phone_id is not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.general.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.messaging.base_url.trim_end_matches('/').to_string(),
            phone_id,
            access_token,
        })
    }

    async fn send_payload(&self, payload: serde_json::Value) -> Result<String> {
        let url = format!("{}/{}/messages", self.base_url, self.phone_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "messaging provider returned HTTP {}: {}",
                status, detail
            )));
        }

        let body: serde_json::Value = response.json().await?;
        body.get("messages")
            .and_then(|m| m.as_array())
            .and_then(|m| m.first())
            .and_then(|m| m.get("id"))
            .and_then(|id| id.as_str())
            .map(|id| id.to_string())
            .ok_or_else(|| {
                Error::Provider("messaging provider response missing message id".to_string())
            })
    }
}

#[async_trait]
impl MessageGateway for WhatsAppGateway {
    async fn send_text(&self, to: &str, body: &str) -> Result<String> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body },
        });

        self.send_payload(payload).await
    }

    async fn send_audio(&self, to: &str, link: &str, caption: Option<&str>) -> Result<String> {
        let mut audio = json!({ "link": link });
        if let Some(caption) = caption {
            audio["caption"] = json!(caption);
        }

        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "audio",
            "audio": audio,
        });

        self.send_payload(payload).await
    }

    fn name(&self) -> &str {
        "whatsapp"
    }
}
