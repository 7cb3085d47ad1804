use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::config::AppConfig;
use crate::{Error, Result};

/// Trait for text-to-speech providers
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize text into MP3 bytes using the given voice
    async fn synthesize(&self, text: &str, language_code: &str, voice: &str) -> Result<Vec<u8>>;

    /// Get the provider name for logging
    fn name(&self) -> &str;
}

const SPEAKING_RATE: f64 = 0.9;
const PITCH: f64 = 0.0;

/// Text-to-speech provider backed by the Google Cloud synthesize endpoint
pub struct GoogleSpeechProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoogleSpeechProvider {
    /// Create a new provider with configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let api_key = config
            .speech
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("speech.api_key is not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.general.request_timeout_secs))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.speech.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl SpeechProvider for GoogleSpeechProvider {
    async fn synthesize(&self, text: &str, language_code: &str, voice: &str) -> Result<Vec<u8>> {
        let url = format!("{}/text:synthesize", self.base_url);

        let payload = json!({
            "input": { "text": text },
            "voice": {
                "languageCode": language_code,
                "name": voice,
            },
            "audioConfig": {
                "audioEncoding": "MP3",
                "speakingRate": SPEAKING_RATE,
                "pitch": PITCH,
            },
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Provider(format!(
                "speech provider returned HTTP {}",
                status
            )));
        }

        let body: serde_json::Value = response.json().await?;
        let audio_content = body
            .get("audioContent")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                Error::Provider("speech provider response missing audioContent".to_string())
            })?;

        BASE64
            .decode(audio_content)
            .map_err(|e| Error::Provider(format!("invalid audio payload: {}", e)))
    }

    fn name(&self) -> &str {
        "google-tts"
    }
}
