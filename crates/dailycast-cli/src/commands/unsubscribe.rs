use std::sync::Arc;

use anyhow::Result;

use dailycast_core::{
    messaging::WhatsAppGateway,
    storage::{Database, SqliteEventLog},
    subscribers::SubscriptionService,
    AppConfig,
};

pub async fn run(db: &Database, config: &AppConfig, address: &str) -> Result<()> {
    let events = Arc::new(SqliteEventLog::new(db.clone()));
    let mut service =
        SubscriptionService::new(db.clone(), events, config.general.languages.clone());

    if config.validate_messaging().is_ok() {
        service = service.with_gateway(Arc::new(WhatsAppGateway::new(config)?));
    }

    if service.unsubscribe(address).await? {
        println!("Unsubscribed {}.", address);
    } else {
        println!("No active subscription found for {}.", address);
    }

    Ok(())
}
