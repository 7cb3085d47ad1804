use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::Database;
use crate::Result;

/// Severity of a recorded system event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warning,
    Error,
}

impl EventLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventLevel::Info => "info",
            EventLevel::Warning => "warning",
            EventLevel::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "warning" => EventLevel::Warning,
            "error" => EventLevel::Error,
            _ => EventLevel::Info,
        }
    }
}

/// One row of the operational audit trail
#[derive(Debug, Clone)]
pub struct SystemEvent {
    pub id: i64,
    pub level: EventLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only sink for operational events. Components hold this seam
/// instead of a database handle; recording never fails from the caller's
/// point of view.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn record(&self, level: EventLevel, message: &str);
}

/// Event sink backed by the system_events table. Every event is also
/// emitted as a tracing line; a failed insert degrades to a warning.
#[derive(Clone)]
pub struct SqliteEventLog {
    db: Database,
}

#[derive(FromRow)]
struct EventRow {
    id: i64,
    level: String,
    message: String,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for SystemEvent {
    fn from(row: EventRow) -> Self {
        SystemEvent {
            id: row.id,
            level: EventLevel::parse(&row.level),
            message: row.message,
            created_at: row.created_at,
        }
    }
}

impl SqliteEventLog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get the most recent events
    pub async fn recent(&self, limit: u32) -> Result<Vec<SystemEvent>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT id, level, message, created_at
            FROM system_events
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(SystemEvent::from).collect())
    }

    /// Count events at the given level recorded since the given time
    pub async fn count_since(&self, level: EventLevel, since: DateTime<Utc>) -> Result<u32> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM system_events WHERE level = ? AND created_at >= ?",
        )
        .bind(level.as_str())
        .bind(since)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count.0 as u32)
    }
}

#[async_trait]
impl EventSink for SqliteEventLog {
    async fn record(&self, level: EventLevel, message: &str) {
        match level {
            EventLevel::Info => tracing::info!("{}", message),
            EventLevel::Warning => tracing::warn!("{}", message),
            EventLevel::Error => tracing::error!("{}", message),
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO system_events (level, message, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(level.as_str())
        .bind(message)
        .bind(now)
        .execute(self.db.pool())
        .await;

        if let Err(e) = result {
            tracing::warn!("Failed to persist system event: {}", e);
        }
    }
}

/// In-memory sink for tests
#[cfg(test)]
pub struct MemoryEventLog {
    events: std::sync::Mutex<Vec<(EventLevel, String)>>,
}

#[cfg(test)]
impl MemoryEventLog {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<(EventLevel, String)> {
        self.events.lock().unwrap().clone()
    }

    pub fn count_level(&self, level: EventLevel) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .count()
    }

    pub fn contains(&self, fragment: &str) -> bool {
        self.events
            .lock()
            .unwrap()
            .iter()
            .any(|(_, message)| message.contains(fragment))
    }
}

#[cfg(test)]
#[async_trait]
impl EventSink for MemoryEventLog {
    async fn record(&self, level: EventLevel, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}
