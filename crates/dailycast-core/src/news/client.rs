use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::models::Headline;
use crate::config::AppConfig;
use crate::{Error, Result};

const MAX_RETRIES: u32 = 3;
const INITIAL_RETRY_DELAY_MS: u64 = 500;

/// Source of raw headlines
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Fetch top headlines for a language, optionally limited to one category
    async fn top_headlines(
        &self,
        language: &str,
        category: Option<&str>,
        count: u32,
    ) -> Result<Vec<Headline>>;

    /// Get the provider name for logging
    fn name(&self) -> &str;
}

/// News provider backed by the NewsAPI-style top-headlines endpoint
pub struct NewsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    country: String,
}

#[derive(Deserialize)]
struct HeadlinesResponse {
    status: String,
    #[serde(default)]
    articles: Vec<HeadlineItem>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct HeadlineItem {
    source: Option<SourceRef>,
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url: Option<String>,
}

#[derive(Deserialize)]
struct SourceRef {
    name: Option<String>,
}

impl NewsApiClient {
    /// Create a new client with configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let api_key = config
            .news
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("news.api_key is not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.general.request_timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.news.base_url.trim_end_matches('/').to_string(),
            api_key,
            country: config.news.country.clone(),
        })
    }

    /// GET with retry and exponential backoff on throttling responses
    async fn get_with_retry(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let mut last_error = None;
        let mut delay_ms = INITIAL_RETRY_DELAY_MS;

        for attempt in 0..MAX_RETRIES {
            match self.client.get(url).query(query).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS
                        || status == reqwest::StatusCode::SERVICE_UNAVAILABLE
                    {
                        tracing::warn!(
                            "Received {} from news provider, retrying after {}ms...",
                            status,
                            delay_ms
                        );
                        last_error =
                            Some(Error::Provider(format!("news provider returned {}", status)));
                    } else {
                        return Ok(response);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "News request failed (attempt {}): {}",
                        attempt + 1,
                        e
                    );
                    last_error = Some(Error::Http(e));
                }
            }

            if attempt < MAX_RETRIES - 1 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                delay_ms *= 2;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::Provider(format!("news request failed after {} retries", MAX_RETRIES))
        }))
    }
}

/// Turn a provider response into headlines, skipping unusable items.
/// The description is preferred over the (often truncated) content field.
fn map_response(response: HeadlinesResponse) -> Result<Vec<Headline>> {
    if response.status != "ok" {
        return Err(Error::Provider(format!(
            "news provider returned status '{}': {}",
            response.status,
            response.message.unwrap_or_else(|| "no detail".to_string())
        )));
    }

    let headlines = response
        .articles
        .into_iter()
        .filter_map(|item| {
            let title = item.title.filter(|t| !t.trim().is_empty())?;
            let source = item
                .source
                .and_then(|s| s.name)
                .filter(|n| !n.trim().is_empty())?;

            Some(Headline {
                title,
                body: item.description.or(item.content),
                source,
                url: item.url,
            })
        })
        .collect();

    Ok(headlines)
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    async fn top_headlines(
        &self,
        language: &str,
        category: Option<&str>,
        count: u32,
    ) -> Result<Vec<Headline>> {
        let url = format!("{}/top-headlines", self.base_url);

        let mut query = vec![
            ("language", language.to_string()),
            ("pageSize", count.to_string()),
            ("apiKey", self.api_key.clone()),
        ];
        if let Some(category) = category {
            query.push(("country", self.country.clone()));
            query.push(("category", category.to_string()));
        }

        tracing::debug!(
            "Fetching top headlines: language={} category={:?} count={}",
            language,
            category,
            count
        );

        let response = self.get_with_retry(&url, &query).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Provider(format!(
                "news provider returned HTTP {}",
                status
            )));
        }

        let parsed: HeadlinesResponse = response.json().await?;
        map_response(parsed)
    }

    fn name(&self) -> &str {
        "newsapi"
    }
}
