use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a stored news article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub body: Option<String>,
    pub source: String,
    pub url: Option<String>,
    pub category: String,
    pub language: String,
    pub summary: Option<String>,
    pub audio_file: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data required to store a new article
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub body: Option<String>,
    pub source: String,
    pub url: Option<String>,
    pub category: String,
    pub language: String,
}

/// A headline as returned by the news provider, before storage
#[derive(Debug, Clone)]
pub struct Headline {
    pub title: String,
    pub body: Option<String>,
    pub source: String,
    pub url: Option<String>,
}

impl Article {
    /// Get a preview of the body (first N characters, char-boundary safe)
    pub fn excerpt(&self, max_len: usize) -> String {
        let text = self.body.as_deref().unwrap_or("");

        if max_len == 0 {
            return String::new();
        }

        if text.len() <= max_len {
            text.to_string()
        } else {
            let mut end = 0;
            for (idx, ch) in text.char_indices() {
                let next = idx + ch.len_utf8();
                if next > max_len {
                    break;
                }
                end = next;
            }
            format!("{}...", &text[..end])
        }
    }
}
