use async_trait::async_trait;
use std::sync::Arc;

use super::providers::{ChatProvider, OpenAiProvider};
use crate::config::AppConfig;
use crate::news::Article;
use crate::storage::{EventLevel, EventSink};
use crate::Result;

const ARTICLE_SUMMARY_TOKENS: u32 = 200;
const DAILY_SUMMARY_TOKENS: u32 = 500;
const DIGEST_ARTICLE_LIMIT: usize = 5;
const EXCERPT_CHARS: usize = 200;

/// Digest text production as the delivery pipeline sees it. Failures
/// surface as None; the cause is recorded, never propagated.
#[async_trait]
pub trait DigestSummarizer: Send + Sync {
    /// Summarize a single article for audio narration
    async fn summarize_article(&self, title: &str, body: &str, language: &str) -> Option<String>;

    /// Compose one narration script from the day's articles
    async fn create_daily_summary(&self, articles: &[Article], language: &str) -> Option<String>;
}

/// AI summarizer that wraps the configured chat provider
pub struct Summarizer {
    provider: Arc<dyn ChatProvider>,
    events: Arc<dyn EventSink>,
}

/// Map a language code to the name used in prompts; unknown codes
/// fall back to English.
pub fn language_name(code: &str) -> &'static str {
    match code {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "pt" => "Portuguese",
        _ => "English",
    }
}

impl Summarizer {
    pub fn new(provider: Arc<dyn ChatProvider>, events: Arc<dyn EventSink>) -> Self {
        Self { provider, events }
    }

    /// Create a summarizer from configuration
    pub fn from_config(config: &AppConfig, events: Arc<dyn EventSink>) -> Result<Self> {
        let api_key = config
            .ai
            .api_key
            .as_ref()
            .ok_or_else(|| crate::Error::Config("ai.api_key is not set".to_string()))?;

        let provider = Arc::new(OpenAiProvider::new(
            api_key,
            &config.ai.model,
            config.ai.completion_timeout_secs,
        ));

        Ok(Self::new(provider, events))
    }

    /// One numbered block per article; a stored summary wins over the
    /// raw body excerpt.
    fn compose_stories(articles: &[Article]) -> String {
        articles
            .iter()
            .take(DIGEST_ARTICLE_LIMIT)
            .enumerate()
            .map(|(i, article)| {
                let gist = article
                    .summary
                    .clone()
                    .unwrap_or_else(|| article.excerpt(EXCERPT_CHARS));
                format!("{}. {}: {}", i + 1, article.title, gist)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[async_trait]
impl DigestSummarizer for Summarizer {
    async fn summarize_article(&self, title: &str, body: &str, language: &str) -> Option<String> {
        let system =
            "You are a news summarizer. Create concise, engaging summaries suitable for audio narration.";
        let prompt = format!(
            "Summarize this news article in {} in a conversational tone, keeping it under 150 words:\n\nTitle: {}\n\n{}",
            language_name(language),
            title,
            body
        );

        match self
            .provider
            .complete(system, &prompt, ARTICLE_SUMMARY_TOKENS)
            .await
        {
            Ok(summary) => {
                let summary = summary.trim().to_string();
                if summary.is_empty() {
                    self.events
                        .record(
                            EventLevel::Error,
                            &format!("Empty summary returned for article '{}'", title),
                        )
                        .await;
                    return None;
                }
                self.events
                    .record(
                        EventLevel::Info,
                        &format!("Summarized article '{}' ({})", title, language),
                    )
                    .await;
                Some(summary)
            }
            Err(e) => {
                self.events
                    .record(
                        EventLevel::Error,
                        &format!("Summary generation failed for article '{}': {}", title, e),
                    )
                    .await;
                None
            }
        }
    }

    async fn create_daily_summary(&self, articles: &[Article], language: &str) -> Option<String> {
        if articles.is_empty() {
            return None;
        }

        let stories = Self::compose_stories(articles);
        let system =
            "You are a news anchor creating a daily news digest. Be engaging and conversational.";
        let prompt = format!(
            "Create a cohesive daily news summary in {} from these stories. Make it flow naturally like a 2-3 minute podcast script:\n\n{}",
            language_name(language),
            stories
        );

        match self
            .provider
            .complete(system, &prompt, DAILY_SUMMARY_TOKENS)
            .await
        {
            Ok(summary) => {
                let summary = summary.trim().to_string();
                if summary.is_empty() {
                    self.events
                        .record(
                            EventLevel::Error,
                            &format!("Empty daily summary returned for language '{}'", language),
                        )
                        .await;
                    return None;
                }
                self.events
                    .record(
                        EventLevel::Info,
                        &format!("Generated daily summary for language '{}'", language),
                    )
                    .await;
                Some(summary)
            }
            Err(e) => {
                self.events
                    .record(
                        EventLevel::Error,
                        &format!(
                            "Daily summary generation failed for language '{}': {}",
                            language, e
                        ),
                    )
                    .await;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::event_log::MemoryEventLog;
    use crate::Error;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    struct RecordingProvider {
        calls: AtomicU32,
        last_prompt: Mutex<String>,
        response: Result<String>,
    }

    impl RecordingProvider {
        fn returning(text: &str) -> Self {
            Self {
                calls: AtomicU32::new(0),
                last_prompt: Mutex::new(String::new()),
                response: Ok(text.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicU32::new(0),
                last_prompt: Mutex::new(String::new()),
                response: Err(Error::Provider("model offline".to_string())),
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatProvider for RecordingProvider {
        async fn complete(&self, _system: &str, prompt: &str, _max_tokens: u32) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = prompt.to_string();
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(Error::Provider("model offline".to_string())),
            }
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn article(title: &str, summary: Option<&str>, body: &str) -> Article {
        Article {
            id: Uuid::new_v4(),
            title: title.to_string(),
            body: Some(body.to_string()),
            source: "Reuters".to_string(),
            url: None,
            category: "general".to_string(),
            language: "en".to_string(),
            summary: summary.map(|s| s.to_string()),
            audio_file: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_summarize_article_returns_trimmed_text() {
        let provider = Arc::new(RecordingProvider::returning("  A tidy summary.  "));
        let events = Arc::new(MemoryEventLog::new());
        let summarizer = Summarizer::new(provider.clone(), events);

        let summary = summarizer
            .summarize_article("Title", "Body", "en")
            .await
            .unwrap();
        assert_eq!(summary, "A tidy summary.");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_becomes_none_with_event() {
        let provider = Arc::new(RecordingProvider::failing());
        let events = Arc::new(MemoryEventLog::new());
        let summarizer = Summarizer::new(provider, events.clone());

        let summary = summarizer.summarize_article("Title", "Body", "en").await;
        assert!(summary.is_none());
        assert_eq!(events.count_level(EventLevel::Error), 1);
        assert!(events.contains("model offline"));
    }

    #[tokio::test]
    async fn test_daily_summary_empty_input_skips_provider() {
        let provider = Arc::new(RecordingProvider::returning("unused"));
        let events = Arc::new(MemoryEventLog::new());
        let summarizer = Summarizer::new(provider.clone(), events);

        let summary = summarizer.create_daily_summary(&[], "en").await;
        assert!(summary.is_none());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_daily_summary_uses_top_five_articles() {
        let provider = Arc::new(RecordingProvider::returning("The digest"));
        let events = Arc::new(MemoryEventLog::new());
        let summarizer = Summarizer::new(provider.clone(), events);

        let articles: Vec<Article> = (1..=7)
            .map(|i| article(&format!("Story {}", i), None, "Body"))
            .collect();

        let summary = summarizer.create_daily_summary(&articles, "en").await;
        assert_eq!(summary.as_deref(), Some("The digest"));

        let prompt = provider.last_prompt.lock().unwrap().clone();
        assert!(prompt.contains("5. Story 5"));
        assert!(!prompt.contains("Story 6"));
    }

    #[tokio::test]
    async fn test_daily_summary_prefers_stored_summaries() {
        let provider = Arc::new(RecordingProvider::returning("The digest"));
        let events = Arc::new(MemoryEventLog::new());
        let summarizer = Summarizer::new(provider.clone(), events);

        let long_body = "x".repeat(400);
        let articles = vec![
            article("Summarized", Some("Stored gist"), &long_body),
            article("Raw", None, &long_body),
        ];

        summarizer.create_daily_summary(&articles, "en").await;

        let prompt = provider.last_prompt.lock().unwrap().clone();
        assert!(prompt.contains("Summarized: Stored gist"));
        // The raw article falls back to a bounded excerpt
        assert!(prompt.contains("Raw: xxx"));
        assert!(!prompt.contains(&long_body));
    }

    #[tokio::test]
    async fn test_prompt_names_the_language() {
        let provider = Arc::new(RecordingProvider::returning("El resumen"));
        let events = Arc::new(MemoryEventLog::new());
        let summarizer = Summarizer::new(provider.clone(), events);

        summarizer
            .create_daily_summary(&[article("Historia", None, "Cuerpo")], "es")
            .await;

        let prompt = provider.last_prompt.lock().unwrap().clone();
        assert!(prompt.contains("in Spanish"));
    }

    #[test]
    fn test_language_name_fallback() {
        assert_eq!(language_name("de"), "German");
        assert_eq!(language_name("xx"), "English");
    }
}
