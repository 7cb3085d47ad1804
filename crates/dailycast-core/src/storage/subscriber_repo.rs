use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Database;
use crate::subscribers::Subscriber;
use crate::{Error, Result};

/// Repository for subscriber CRUD operations
pub struct SubscriberRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct SubscriberRow {
    id: String,
    address: String,
    language: String,
    is_active: i32,
    last_delivery: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<SubscriberRow> for Subscriber {
    fn from(row: SubscriberRow) -> Self {
        Subscriber {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            address: row.address,
            language: row.language,
            is_active: row.is_active != 0,
            last_delivery: row.last_delivery,
            created_at: row.created_at,
        }
    }
}

impl<'a> SubscriberRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new subscriber with the given canonical address
    pub async fn create(&self, address: &str, language: &str) -> Result<Subscriber> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO subscribers (id, address, language, is_active, created_at)
            VALUES (?, ?, ?, 1, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(address)
        .bind(language)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| Error::SubscriberNotFound(id.to_string()))
    }

    /// Find a subscriber by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Subscriber>> {
        let row: Option<SubscriberRow> = sqlx::query_as(
            r#"
            SELECT id, address, language, is_active, last_delivery, created_at
            FROM subscribers
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Subscriber::from))
    }

    /// Find a subscriber by canonical address, active or not
    pub async fn find_by_address(&self, address: &str) -> Result<Option<Subscriber>> {
        let row: Option<SubscriberRow> = sqlx::query_as(
            r#"
            SELECT id, address, language, is_active, last_delivery, created_at
            FROM subscribers
            WHERE address = ?
            "#,
        )
        .bind(address)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Subscriber::from))
    }

    /// Get all active subscribers
    pub async fn list_active(&self) -> Result<Vec<Subscriber>> {
        let rows: Vec<SubscriberRow> = sqlx::query_as(
            r#"
            SELECT id, address, language, is_active, last_delivery, created_at
            FROM subscribers
            WHERE is_active = 1
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Subscriber::from).collect())
    }

    /// Get all active subscribers for one language
    pub async fn list_active_by_language(&self, language: &str) -> Result<Vec<Subscriber>> {
        let rows: Vec<SubscriberRow> = sqlx::query_as(
            r#"
            SELECT id, address, language, is_active, last_delivery, created_at
            FROM subscribers
            WHERE is_active = 1 AND language = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(language)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Subscriber::from).collect())
    }

    /// Get all subscribers, newest first
    pub async fn list_all(&self) -> Result<Vec<Subscriber>> {
        let rows: Vec<SubscriberRow> = sqlx::query_as(
            r#"
            SELECT id, address, language, is_active, last_delivery, created_at
            FROM subscribers
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Subscriber::from).collect())
    }

    /// Set the active flag; the row is never deleted
    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE subscribers
            SET is_active = ?
            WHERE id = ?
            "#,
        )
        .bind(active as i32)
        .bind(id.to_string())
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Update the preferred language
    pub async fn set_language(&self, id: Uuid, language: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE subscribers
            SET language = ?
            WHERE id = ?
            "#,
        )
        .bind(language)
        .bind(id.to_string())
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Record a successful delivery time
    pub async fn touch_last_delivery(&self, id: Uuid) -> Result<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE subscribers
            SET last_delivery = ?
            WHERE id = ?
            "#,
        )
        .bind(now)
        .bind(id.to_string())
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Get the active subscriber count
    pub async fn count_active(&self) -> Result<u32> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM subscribers WHERE is_active = 1")
                .fetch_one(self.db.pool())
                .await?;

        Ok(count.0 as u32)
    }
}
