use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Database;
use crate::news::{Article, NewArticle};
use crate::Result;

/// Repository for article CRUD operations
pub struct ArticleRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct ArticleRow {
    id: String,
    title: String,
    body: Option<String>,
    source: String,
    url: Option<String>,
    category: String,
    language: String,
    summary: Option<String>,
    audio_file: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            title: row.title,
            body: row.body,
            source: row.source,
            url: row.url,
            category: row.category,
            language: row.language,
            summary: row.summary,
            audio_file: row.audio_file,
            created_at: row.created_at,
        }
    }
}

impl<'a> ArticleRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new article (with deduplication by title + source + language).
    /// Returns None when the same headline was already stored for the language.
    pub async fn create(&self, new_article: &NewArticle) -> Result<Option<Article>> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        // Try to insert, ignore if duplicate (title, source, language).
        // The unique constraint is the backstop when two refreshes race.
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO articles
            (id, title, body, source, url, category, language, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&new_article.title)
        .bind(&new_article.body)
        .bind(&new_article.source)
        .bind(&new_article.url)
        .bind(&new_article.category)
        .bind(&new_article.language)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() > 0 {
            self.find_by_id(id).await
        } else {
            // Article already exists
            Ok(None)
        }
    }

    /// Create multiple articles, returning the newly created ones
    pub async fn create_many(&self, articles: &[NewArticle]) -> Result<Vec<Article>> {
        let mut created = Vec::new();

        for article in articles {
            if let Some(stored) = self.create(article).await? {
                created.push(stored);
            }
        }

        Ok(created)
    }

    /// Find an article by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>> {
        let row: Option<ArticleRow> = sqlx::query_as(
            r#"
            SELECT id, title, body, source, url, category, language,
                   summary, audio_file, created_at
            FROM articles
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Article::from))
    }

    /// Get the most recent articles for a language, optionally one category
    pub async fn list_recent(
        &self,
        language: &str,
        category: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = if let Some(category) = category {
            sqlx::query_as(
                r#"
                SELECT id, title, body, source, url, category, language,
                       summary, audio_file, created_at
                FROM articles
                WHERE language = ? AND category = ?
                ORDER BY created_at DESC
                LIMIT ?
                "#,
            )
            .bind(language)
            .bind(category)
            .bind(limit)
            .fetch_all(self.db.pool())
            .await?
        } else {
            sqlx::query_as(
                r#"
                SELECT id, title, body, source, url, category, language,
                       summary, audio_file, created_at
                FROM articles
                WHERE language = ?
                ORDER BY created_at DESC
                LIMIT ?
                "#,
            )
            .bind(language)
            .bind(limit)
            .fetch_all(self.db.pool())
            .await?
        };

        Ok(rows.into_iter().map(Article::from).collect())
    }

    /// Get articles that still need a per-article summary
    pub async fn list_unsummarized(&self, language: &str, limit: u32) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = sqlx::query_as(
            r#"
            SELECT id, title, body, source, url, category, language,
                   summary, audio_file, created_at
            FROM articles
            WHERE language = ? AND summary IS NULL
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(language)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    /// Update article summary
    pub async fn update_summary(&self, id: Uuid, summary: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE articles
            SET summary = ?
            WHERE id = ?
            "#,
        )
        .bind(summary)
        .bind(id.to_string())
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Count articles stored since the given time
    pub async fn count_since(&self, since: DateTime<Utc>) -> Result<u32> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM articles WHERE created_at >= ?")
                .bind(since)
                .fetch_one(self.db.pool())
                .await?;

        Ok(count.0 as u32)
    }
}
