use std::sync::Arc;

use anyhow::Result;

use dailycast_core::{
    ai::Summarizer,
    delivery::{DeliveryDispatcher, GroupOutcome},
    messaging::WhatsAppGateway,
    news::{NewsApiClient, NewsIngestor},
    speech::Narrator,
    storage::{Database, EventSink, SqliteEventLog},
    AppConfig,
};

fn print_outcome(language: &str, outcome: &GroupOutcome) {
    match outcome {
        GroupOutcome::Delivered { sent, total } => {
            println!("  {}: sent to {}/{} subscribers", language, sent, total)
        }
        GroupOutcome::NoSubscribers => println!("  {}: no active subscribers", language),
        GroupOutcome::NoArticles => println!("  {}: no articles available", language),
        GroupOutcome::NoSummary => println!("  {}: summary generation failed", language),
        GroupOutcome::NoAudio => println!("  {}: audio synthesis failed", language),
    }
}

pub async fn run(db: &Database, config: &AppConfig, language: Option<&str>) -> Result<()> {
    config.validate()?;

    let events: Arc<dyn EventSink> = Arc::new(SqliteEventLog::new(db.clone()));
    let provider = Arc::new(NewsApiClient::new(config)?);
    let ingestor = Arc::new(NewsIngestor::new(
        db.clone(),
        provider,
        events.clone(),
        config,
    ));
    let summarizer = Arc::new(Summarizer::from_config(config, events.clone())?);
    let narrator = Arc::new(Narrator::from_config(config, events.clone())?);
    let gateway = Arc::new(WhatsAppGateway::new(config)?);

    let dispatcher = DeliveryDispatcher::new(
        db.clone(),
        ingestor,
        summarizer,
        narrator,
        gateway,
        events,
    );

    match language {
        Some(language) => {
            println!("Delivering the '{}' digest...\n", language);
            let outcome = dispatcher.run_language(language).await?;
            print_outcome(language, &outcome);
        }
        None => {
            println!("Running a full delivery round...\n");
            let summary = dispatcher.run().await?;
            for (language, outcome) in &summary.groups {
                print_outcome(language, outcome);
            }
            println!(
                "\nDelivered to {} of {} subscribers.",
                summary.delivered, summary.attempted
            );
        }
    }

    Ok(())
}
