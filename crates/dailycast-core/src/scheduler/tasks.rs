use chrono::{NaiveTime, Utc};

use crate::ai::{DigestSummarizer, Summarizer};
use crate::delivery::DeliveryStatus;
use crate::news::NewsIngestor;
use crate::storage::{
    ArticleRepository, Database, DeliveryRepository, EventLevel, EventSink, SubscriberRepository,
};
use crate::Result;

const SUMMARY_BACKFILL_LIMIT: u32 = 5;

/// Fetch fresh headlines for every language, then backfill summaries for
/// stored articles that still lack one. Returns the new article count.
pub async fn refresh_content(
    db: &Database,
    ingestor: &NewsIngestor,
    summarizer: &Summarizer,
    languages: &[String],
) -> Result<u32> {
    let new_articles = ingestor.fetch_all_languages().await?;

    let repo = ArticleRepository::new(db);
    let mut summarized = 0;

    for language in languages {
        let pending = repo
            .list_unsummarized(language, SUMMARY_BACKFILL_LIMIT)
            .await?;

        for article in pending {
            let body = match article.body.as_deref() {
                Some(body) if !body.trim().is_empty() => body,
                _ => continue,
            };

            if let Some(summary) = summarizer
                .summarize_article(&article.title, body, language)
                .await
            {
                repo.update_summary(article.id, &summary).await?;
                summarized += 1;
            }
        }
    }

    if summarized > 0 {
        tracing::info!("Backfilled {} article summaries", summarized);
    }

    Ok(new_articles)
}

/// Record a one-line operational snapshot of the service
pub async fn health_check(db: &Database, events: &dyn EventSink) -> Result<()> {
    let midnight = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();

    let subscribers = SubscriberRepository::new(db).count_active().await?;
    let articles_today = ArticleRepository::new(db).count_since(midnight).await?;
    let failed_today = DeliveryRepository::new(db)
        .count_since(DeliveryStatus::Failed, midnight)
        .await?;

    events
        .record(
            EventLevel::Info,
            &format!(
                "Health check: {} active subscribers, {} articles today, {} failed deliveries today",
                subscribers, articles_today, failed_today
            ),
        )
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::providers::ChatProvider;
    use crate::config::AppConfig;
    use crate::news::{Headline, NewArticle, NewsProvider};
    use crate::storage::event_log::MemoryEventLog;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct EmptyProvider;

    #[async_trait]
    impl NewsProvider for EmptyProvider {
        async fn top_headlines(
            &self,
            _language: &str,
            _category: Option<&str>,
            _count: u32,
        ) -> Result<Vec<Headline>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "empty"
        }
    }

    struct CountingChat {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ChatProvider for CountingChat {
        async fn complete(&self, _system: &str, _prompt: &str, _max_tokens: u32) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("Fresh summary".to_string())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn new_article(title: &str, body: Option<&str>) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            body: body.map(|b| b.to_string()),
            source: "Reuters".to_string(),
            url: None,
            category: "general".to_string(),
            language: "en".to_string(),
        }
    }

    #[tokio::test]
    async fn test_refresh_content_backfills_missing_summaries() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);

        let with_body = repo.create(&new_article("Has body", Some("Body text")))
            .await
            .unwrap()
            .unwrap();
        repo.create(&new_article("No body", None)).await.unwrap();
        let done = repo
            .create(&new_article("Done", Some("Other text")))
            .await
            .unwrap()
            .unwrap();
        repo.update_summary(done.id, "existing").await.unwrap();

        let mut config = AppConfig::default();
        config.general.languages = vec!["en".to_string()];

        let events = Arc::new(MemoryEventLog::new());
        let ingestor = NewsIngestor::new(
            db.clone(),
            Arc::new(EmptyProvider),
            events.clone(),
            &config,
        );
        let chat = Arc::new(CountingChat {
            calls: AtomicU32::new(0),
        });
        let summarizer = Summarizer::new(chat.clone(), events);

        let new_count = refresh_content(&db, &ingestor, &summarizer, &config.general.languages)
            .await
            .unwrap();

        assert_eq!(new_count, 0);
        // Only the bodied, unsummarized article reaches the provider
        assert_eq!(chat.calls.load(Ordering::SeqCst), 1);

        let refreshed = repo.find_by_id(with_body.id).await.unwrap().unwrap();
        assert_eq!(refreshed.summary.as_deref(), Some("Fresh summary"));

        let still_pending = repo.list_unsummarized("en", 10).await.unwrap();
        assert_eq!(still_pending.len(), 1);
        assert_eq!(still_pending[0].title, "No body");
    }

    #[tokio::test]
    async fn test_health_check_reports_todays_counts() {
        let db = Database::new_in_memory().await.unwrap();

        let subscriber = SubscriberRepository::new(&db)
            .create("15551234567", "en")
            .await
            .unwrap();
        ArticleRepository::new(&db)
            .create(&new_article("Today", Some("Body")))
            .await
            .unwrap();
        DeliveryRepository::new(&db)
            .append(subscriber.id, None, DeliveryStatus::Failed, Some("timeout"))
            .await
            .unwrap();

        let events = MemoryEventLog::new();
        health_check(&db, &events).await.unwrap();

        assert!(events.contains(
            "Health check: 1 active subscribers, 1 articles today, 1 failed deliveries today"
        ));
    }
}
