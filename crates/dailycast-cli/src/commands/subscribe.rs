use std::sync::Arc;

use anyhow::Result;

use dailycast_core::{
    messaging::WhatsAppGateway,
    storage::{Database, SqliteEventLog},
    subscribers::{SubscribeOutcome, SubscriptionService},
    AppConfig,
};

pub async fn run(db: &Database, config: &AppConfig, address: &str, language: &str) -> Result<()> {
    let events = Arc::new(SqliteEventLog::new(db.clone()));
    let mut service =
        SubscriptionService::new(db.clone(), events, config.general.languages.clone());

    // Welcome texts go out only when the gateway is configured
    if config.validate_messaging().is_ok() {
        service = service.with_gateway(Arc::new(WhatsAppGateway::new(config)?));
    }

    match service.subscribe(address, language).await? {
        SubscribeOutcome::Created(subscriber) => {
            println!("Subscribed {} ({})", subscriber.address, subscriber.language);
        }
        SubscribeOutcome::Reactivated(subscriber) => {
            println!(
                "Reactivated {} ({})",
                subscriber.address, subscriber.language
            );
        }
        SubscribeOutcome::AlreadyActive(subscriber) => {
            println!("{} is already subscribed.", subscriber.address);
        }
    }

    Ok(())
}
