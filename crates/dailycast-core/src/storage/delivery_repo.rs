use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Database;
use crate::delivery::{DeliveryRecord, DeliveryStatus};
use crate::Result;

/// Repository for the append-only delivery log
pub struct DeliveryRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct DeliveryRow {
    id: i64,
    subscriber_id: String,
    article_id: Option<String>,
    status: String,
    sent_at: DateTime<Utc>,
    error: Option<String>,
}

impl From<DeliveryRow> for DeliveryRecord {
    fn from(row: DeliveryRow) -> Self {
        DeliveryRecord {
            id: row.id,
            subscriber_id: Uuid::parse_str(&row.subscriber_id).unwrap_or_default(),
            article_id: row
                .article_id
                .and_then(|id| Uuid::parse_str(&id).ok()),
            status: DeliveryStatus::parse(&row.status),
            sent_at: row.sent_at,
            error: row.error,
        }
    }
}

impl<'a> DeliveryRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append one attempt outcome. Rows are never updated or removed.
    pub async fn append(
        &self,
        subscriber_id: Uuid,
        article_id: Option<Uuid>,
        status: DeliveryStatus,
        error: Option<&str>,
    ) -> Result<DeliveryRecord> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO delivery_log (subscriber_id, article_id, status, sent_at, error)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(subscriber_id.to_string())
        .bind(article_id.map(|id| id.to_string()))
        .bind(status.as_str())
        .bind(now)
        .bind(error)
        .execute(self.db.pool())
        .await?;

        Ok(DeliveryRecord {
            id: result.last_insert_rowid(),
            subscriber_id,
            article_id,
            status,
            sent_at: now,
            error: error.map(|e| e.to_string()),
        })
    }

    /// Get the attempts logged for one subscriber, newest first
    pub async fn list_for_subscriber(
        &self,
        subscriber_id: Uuid,
        limit: u32,
    ) -> Result<Vec<DeliveryRecord>> {
        let rows: Vec<DeliveryRow> = sqlx::query_as(
            r#"
            SELECT id, subscriber_id, article_id, status, sent_at, error
            FROM delivery_log
            WHERE subscriber_id = ?
            ORDER BY sent_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(subscriber_id.to_string())
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(DeliveryRecord::from).collect())
    }

    /// Count attempts with the given status logged since the given time
    pub async fn count_since(&self, status: DeliveryStatus, since: DateTime<Utc>) -> Result<u32> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM delivery_log WHERE status = ? AND sent_at >= ?",
        )
        .bind(status.as_str())
        .bind(since)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count.0 as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SubscriberRepository;

    #[tokio::test]
    async fn test_append_keeps_every_attempt() {
        let db = Database::new_in_memory().await.unwrap();
        let subscriber = SubscriberRepository::new(&db)
            .create("15551234567", "en")
            .await
            .unwrap();
        let repo = DeliveryRepository::new(&db);

        repo.append(subscriber.id, None, DeliveryStatus::Failed, Some("timeout"))
            .await
            .unwrap();
        repo.append(subscriber.id, None, DeliveryStatus::Sent, None)
            .await
            .unwrap();

        let records = repo.list_for_subscriber(subscriber.id, 10).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, DeliveryStatus::Sent);
        assert_eq!(records[1].status, DeliveryStatus::Failed);
        assert_eq!(records[1].error.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn test_count_since_filters_status() {
        let db = Database::new_in_memory().await.unwrap();
        let subscriber = SubscriberRepository::new(&db)
            .create("15551234567", "en")
            .await
            .unwrap();
        let repo = DeliveryRepository::new(&db);

        repo.append(subscriber.id, None, DeliveryStatus::Sent, None)
            .await
            .unwrap();
        repo.append(subscriber.id, None, DeliveryStatus::Failed, Some("rejected"))
            .await
            .unwrap();

        let midnight = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(
            repo.count_since(DeliveryStatus::Failed, midnight).await.unwrap(),
            1
        );
        assert_eq!(
            repo.count_since(DeliveryStatus::Sent, midnight).await.unwrap(),
            1
        );
    }
}
