mod client;
mod ingest;
mod models;

pub use client::{NewsApiClient, NewsProvider};
pub use ingest::{ContentSource, NewsIngestor};
pub use models::{Article, Headline, NewArticle};
