use std::sync::Arc;

use anyhow::Result;

use dailycast_core::{
    storage::{Database, SqliteEventLog},
    subscribers::SubscriptionService,
    AppConfig,
};

pub async fn run(db: &Database, config: &AppConfig, address: &str) -> Result<()> {
    let events = Arc::new(SqliteEventLog::new(db.clone()));
    let service = SubscriptionService::new(db.clone(), events, config.general.languages.clone());

    if service.toggle(address).await? {
        println!("{} is now active.", address);
    } else {
        println!("{} is now inactive.", address);
    }

    Ok(())
}
