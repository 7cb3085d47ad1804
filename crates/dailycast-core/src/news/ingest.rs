use async_trait::async_trait;
use std::sync::Arc;

use super::client::NewsProvider;
use super::models::{Article, NewArticle};
use crate::config::AppConfig;
use crate::storage::{ArticleRepository, Database, EventLevel, EventSink};
use crate::Result;

/// Articles available to the delivery pipeline. The dispatcher depends on
/// this seam, not on the ingestor itself.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Read the most recent stored articles for a language
    async fn recent_articles(&self, language: &str, limit: u32) -> Result<Vec<Article>>;

    /// Fetch fresh headlines for a language and return the newly stored articles
    async fn fetch_news(&self, language: &str, count: u32) -> Result<Vec<Article>>;
}

/// Pulls headlines from the news provider and stores them deduplicated
pub struct NewsIngestor {
    db: Database,
    provider: Arc<dyn NewsProvider>,
    events: Arc<dyn EventSink>,
    languages: Vec<String>,
    categories: Vec<String>,
    articles_per_category: u32,
}

impl NewsIngestor {
    pub fn new(
        db: Database,
        provider: Arc<dyn NewsProvider>,
        events: Arc<dyn EventSink>,
        config: &AppConfig,
    ) -> Self {
        Self {
            db,
            provider,
            events,
            languages: config.general.languages.clone(),
            categories: config.news.categories.clone(),
            articles_per_category: config.news.articles_per_category,
        }
    }

    /// The category used when the caller does not name one
    fn default_category(&self) -> &str {
        self.categories
            .first()
            .map(|c| c.as_str())
            .unwrap_or("general")
    }

    /// Fetch headlines and store the ones not seen before. A provider
    /// failure is recorded and yields an empty list, never an error.
    pub async fn fetch_news(
        &self,
        language: &str,
        category: Option<&str>,
        count: u32,
    ) -> Result<Vec<Article>> {
        let headlines = match self.provider.top_headlines(language, category, count).await {
            Ok(headlines) => headlines,
            Err(e) => {
                self.events
                    .record(
                        EventLevel::Error,
                        &format!("News fetch failed for language '{}': {}", language, e),
                    )
                    .await;
                return Ok(Vec::new());
            }
        };

        let category = category.unwrap_or_else(|| self.default_category());
        let new_articles: Vec<NewArticle> = headlines
            .into_iter()
            .map(|headline| NewArticle {
                title: headline.title,
                body: headline.body,
                source: headline.source,
                url: headline.url,
                category: category.to_string(),
                language: language.to_string(),
            })
            .collect();

        let repo = ArticleRepository::new(&self.db);
        let created = repo.create_many(&new_articles).await?;

        tracing::debug!(
            "Stored {} new articles for language '{}' (category '{}')",
            created.len(),
            language,
            category
        );

        Ok(created)
    }

    /// Fetch every configured category for one language. A failing category
    /// is skipped; the rest still land.
    pub async fn fetch_all_categories(&self, language: &str) -> Result<u32> {
        let mut total = 0;

        for category in self.categories.clone() {
            let created = self
                .fetch_news(language, Some(&category), self.articles_per_category)
                .await?;
            total += created.len() as u32;
        }

        Ok(total)
    }

    /// Fetch every configured category for every supported language
    pub async fn fetch_all_languages(&self) -> Result<u32> {
        let mut total = 0;

        for language in self.languages.clone() {
            total += self.fetch_all_categories(&language).await?;
        }

        if total > 0 {
            self.events
                .record(
                    EventLevel::Info,
                    &format!("Fetched {} new articles across all languages", total),
                )
                .await;
        }

        Ok(total)
    }

    /// Read the most recent stored articles, optionally for one category
    pub async fn recent_articles(
        &self,
        language: &str,
        category: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Article>> {
        let repo = ArticleRepository::new(&self.db);
        repo.list_recent(language, category, limit).await
    }
}

#[async_trait]
impl ContentSource for NewsIngestor {
    async fn recent_articles(&self, language: &str, limit: u32) -> Result<Vec<Article>> {
        NewsIngestor::recent_articles(self, language, None, limit).await
    }

    async fn fetch_news(&self, language: &str, count: u32) -> Result<Vec<Article>> {
        NewsIngestor::fetch_news(self, language, None, count).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::models::Headline;
    use crate::storage::event_log::MemoryEventLog;
    use crate::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StaticProvider {
        headlines: Vec<Headline>,
        calls: AtomicU32,
        fail_category: Option<String>,
    }

    impl StaticProvider {
        fn new(headlines: Vec<Headline>) -> Self {
            Self {
                headlines,
                calls: AtomicU32::new(0),
                fail_category: None,
            }
        }

        fn failing_for(category: &str, headlines: Vec<Headline>) -> Self {
            Self {
                headlines,
                calls: AtomicU32::new(0),
                fail_category: Some(category.to_string()),
            }
        }
    }

    #[async_trait]
    impl NewsProvider for StaticProvider {
        async fn top_headlines(
            &self,
            _language: &str,
            category: Option<&str>,
            count: u32,
        ) -> Result<Vec<Headline>> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(failing) = &self.fail_category {
                if category == Some(failing.as_str()) {
                    return Err(Error::Provider("upstream down".to_string()));
                }
            }

            Ok(self
                .headlines
                .iter()
                .take(count as usize)
                .cloned()
                .collect())
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    fn headline(title: &str) -> Headline {
        Headline {
            title: title.to_string(),
            body: Some("Body".to_string()),
            source: "Reuters".to_string(),
            url: None,
        }
    }

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.general.languages = vec!["en".to_string(), "es".to_string()];
        config.news.categories = vec!["general".to_string(), "business".to_string()];
        config.news.articles_per_category = 5;
        config
    }

    #[tokio::test]
    async fn test_fetch_news_stores_only_unseen_headlines() {
        let db = Database::new_in_memory().await.unwrap();
        let provider = Arc::new(StaticProvider::new(vec![
            headline("First"),
            headline("Second"),
        ]));
        let events = Arc::new(MemoryEventLog::new());
        let ingestor = NewsIngestor::new(db, provider, events, &test_config());

        let first_run = ingestor.fetch_news("en", None, 10).await.unwrap();
        assert_eq!(first_run.len(), 2);

        // The provider repeats itself; nothing new lands
        let second_run = ingestor.fetch_news("en", None, 10).await.unwrap();
        assert_eq!(second_run.len(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_yields_empty_and_records_event() {
        let db = Database::new_in_memory().await.unwrap();
        let provider = Arc::new(StaticProvider::failing_for("general", Vec::new()));
        let events = Arc::new(MemoryEventLog::new());
        let ingestor =
            NewsIngestor::new(db, provider, events.clone(), &test_config());

        let articles = ingestor.fetch_news("en", Some("general"), 10).await.unwrap();
        assert!(articles.is_empty());
        assert_eq!(events.count_level(EventLevel::Error), 1);
        assert!(events.contains("News fetch failed"));
    }

    #[tokio::test]
    async fn test_failing_category_does_not_block_others() {
        let db = Database::new_in_memory().await.unwrap();
        let provider = Arc::new(StaticProvider::failing_for(
            "business",
            vec![headline("First"), headline("Second")],
        ));
        let events = Arc::new(MemoryEventLog::new());
        let ingestor =
            NewsIngestor::new(db, provider, events.clone(), &test_config());

        let total = ingestor.fetch_all_categories("en").await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(events.count_level(EventLevel::Error), 1);
    }

    #[tokio::test]
    async fn test_fetch_all_languages_covers_every_language() {
        let db = Database::new_in_memory().await.unwrap();
        let provider = Arc::new(StaticProvider::new(vec![headline("Shared")]));
        let events = Arc::new(MemoryEventLog::new());
        let ingestor =
            NewsIngestor::new(db.clone(), provider, events, &test_config());

        let total = ingestor.fetch_all_languages().await.unwrap();
        // One headline per language; the second category dedups against the first
        assert_eq!(total, 2);

        let repo = ArticleRepository::new(&db);
        assert_eq!(repo.list_recent("en", None, 10).await.unwrap().len(), 1);
        assert_eq!(repo.list_recent("es", None, 10).await.unwrap().len(), 1);
    }
}
