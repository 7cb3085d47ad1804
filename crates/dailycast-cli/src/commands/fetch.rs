use std::sync::Arc;

use anyhow::Result;

use dailycast_core::{
    news::{NewsApiClient, NewsIngestor},
    storage::{Database, SqliteEventLog},
    AppConfig,
};

pub async fn run(db: &Database, config: &AppConfig, language: Option<&str>) -> Result<()> {
    let events = Arc::new(SqliteEventLog::new(db.clone()));
    let provider = Arc::new(NewsApiClient::new(config)?);
    let ingestor = NewsIngestor::new(db.clone(), provider, events, config);

    let total = match language {
        Some(language) => {
            println!("Fetching headlines for '{}'...", language);
            ingestor.fetch_all_categories(language).await?
        }
        None => {
            println!("Fetching headlines for all languages...");
            ingestor.fetch_all_languages().await?
        }
    };

    println!("Fetch complete. {} new articles stored.", total);

    Ok(())
}
