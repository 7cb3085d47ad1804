use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use super::providers::{GoogleSpeechProvider, SpeechProvider};
use crate::config::AppConfig;
use crate::storage::{EventLevel, EventSink};
use crate::Result;

const TITLE_PREFIX_CHARS: usize = 30;

/// Audio production as the delivery pipeline sees it
#[async_trait]
pub trait DigestNarrator: Send + Sync {
    /// Turn a digest script into a stored MP3 artifact, returning its name
    async fn create_daily_audio(&self, summary: &str, language: &str) -> Option<String>;

    /// Public link under which an artifact can be fetched
    fn public_url(&self, artifact: &str) -> String;
}

/// Narrates digest text into audio artifacts on disk
pub struct Narrator {
    provider: Arc<dyn SpeechProvider>,
    events: Arc<dyn EventSink>,
    audio_dir: PathBuf,
    public_base_url: String,
}

/// Voice pair for a language; unmapped languages narrate in English
fn voice_for(language: &str) -> (&'static str, &'static str) {
    match language {
        "en" => ("en-US", "en-US-Neural2-F"),
        "es" => ("es-ES", "es-ES-Neural2-A"),
        "fr" => ("fr-FR", "fr-FR-Neural2-A"),
        "de" => ("de-DE", "de-DE-Neural2-A"),
        "pt" => ("pt-BR", "pt-BR-Neural2-A"),
        _ => ("en-US", "en-US-Neural2-F"),
    }
}

/// An artifact is removed only when strictly older than the cutoff
fn should_remove(created: DateTime<Utc>, cutoff: DateTime<Utc>) -> bool {
    created < cutoff
}

/// Filesystem-safe title prefix for per-article artifacts
fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
        .take(TITLE_PREFIX_CHARS)
        .collect::<String>()
        .trim()
        .replace(' ', "_")
}

impl Narrator {
    pub fn new(
        provider: Arc<dyn SpeechProvider>,
        events: Arc<dyn EventSink>,
        audio_dir: PathBuf,
        public_base_url: String,
    ) -> Self {
        Self {
            provider,
            events,
            audio_dir,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a narrator from configuration
    pub fn from_config(config: &AppConfig, events: Arc<dyn EventSink>) -> Result<Self> {
        let provider = Arc::new(GoogleSpeechProvider::new(config)?);

        Ok(Self::new(
            provider,
            events,
            config.audio_dir(),
            config.general.public_base_url.clone(),
        ))
    }

    /// Synthesize text into an MP3 artifact under the audio directory.
    /// Empty text short-circuits without reaching the provider.
    pub async fn synthesize(
        &self,
        text: &str,
        language: &str,
        filename: Option<String>,
    ) -> Option<String> {
        if text.trim().is_empty() {
            tracing::debug!("Skipping synthesis of empty text");
            return None;
        }

        let (language_code, voice) = voice_for(language);
        let bytes = match self.provider.synthesize(text, language_code, voice).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.events
                    .record(
                        EventLevel::Error,
                        &format!("Audio synthesis failed for language '{}': {}", language, e),
                    )
                    .await;
                return None;
            }
        };

        let filename =
            filename.unwrap_or_else(|| format!("{}.mp3", Uuid::new_v4().simple()));
        let path = self.audio_dir.join(&filename);

        if let Err(e) = tokio::fs::create_dir_all(&self.audio_dir).await {
            self.events
                .record(
                    EventLevel::Error,
                    &format!("Failed to create audio directory: {}", e),
                )
                .await;
            return None;
        }

        if let Err(e) = tokio::fs::write(&path, &bytes).await {
            self.events
                .record(
                    EventLevel::Error,
                    &format!("Failed to write audio file '{}': {}", filename, e),
                )
                .await;
            return None;
        }

        tracing::debug!("Wrote audio artifact {} ({} bytes)", filename, bytes.len());
        Some(filename)
    }

    /// Synthesize a per-article artifact with a readable name
    pub async fn create_article_audio(
        &self,
        title: &str,
        summary: &str,
        language: &str,
    ) -> Option<String> {
        let prefix = sanitize_title(title);
        let short_id = &Uuid::new_v4().simple().to_string()[..8];
        let filename = if prefix.is_empty() {
            format!("{}.mp3", Uuid::new_v4().simple())
        } else {
            format!("{}_{}.mp3", prefix, short_id)
        };

        self.synthesize(summary, language, Some(filename)).await
    }

    /// Remove artifacts older than the retention window
    pub async fn cleanup_old_audio(&self, days: u32) -> Result<u32> {
        cleanup_audio_dir(&self.audio_dir, self.events.as_ref(), days).await
    }
}

/// Remove MP3 artifacts older than the retention window. Returns the
/// number removed; individual failures are skipped.
pub async fn cleanup_audio_dir(dir: &Path, events: &dyn EventSink, days: u32) -> Result<u32> {
    if !dir.exists() {
        return Ok(0);
    }

    let cutoff = Utc::now() - Duration::days(days as i64);
    let mut removed = 0;

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("mp3") {
            continue;
        }

        let modified = match entry.metadata().await {
            Ok(metadata) => match metadata.modified() {
                Ok(modified) => modified,
                Err(_) => continue,
            },
            Err(_) => continue,
        };

        if should_remove(DateTime::<Utc>::from(modified), cutoff)
            && tokio::fs::remove_file(&path).await.is_ok()
        {
            removed += 1;
        }
    }

    if removed > 0 {
        events
            .record(
                EventLevel::Info,
                &format!("Cleaned up {} old audio files", removed),
            )
            .await;
    }

    Ok(removed)
}

#[async_trait]
impl DigestNarrator for Narrator {
    async fn create_daily_audio(&self, summary: &str, language: &str) -> Option<String> {
        let filename = format!(
            "daily_summary_{}_{}.mp3",
            language,
            Local::now().format("%Y%m%d_%H%M%S")
        );

        self.synthesize(summary, language, Some(filename)).await
    }

    fn public_url(&self, artifact: &str) -> String {
        format!("{}/audio/{}", self.public_base_url, artifact)
    }
}
