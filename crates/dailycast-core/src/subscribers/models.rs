use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a digest subscriber
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: Uuid,
    /// Canonical messaging address (digits only, country prefix included)
    pub address: String,
    pub language: String,
    pub is_active: bool,
    pub last_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
