use anyhow::Result;
use chrono::{NaiveTime, Utc};

use dailycast_core::{
    delivery::DeliveryStatus,
    storage::{
        ArticleRepository, Database, DeliveryRepository, EventLevel, SqliteEventLog,
        SubscriberRepository,
    },
};

pub async fn run(db: &Database) -> Result<()> {
    let midnight = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();

    let active = SubscriberRepository::new(db).count_active().await?;
    let articles_today = ArticleRepository::new(db).count_since(midnight).await?;
    let delivery_repo = DeliveryRepository::new(db);
    let sent_today = delivery_repo
        .count_since(DeliveryStatus::Sent, midnight)
        .await?;
    let failed_today = delivery_repo
        .count_since(DeliveryStatus::Failed, midnight)
        .await?;

    let log = SqliteEventLog::new(db.clone());
    let errors_today = log.count_since(EventLevel::Error, midnight).await?;

    println!("Dailycast status\n");
    println!("  Active subscribers: {}", active);
    println!("  Articles today: {}", articles_today);
    println!(
        "  Deliveries today: {} sent, {} failed",
        sent_today, failed_today
    );
    println!("  Error events today: {}", errors_today);

    let events = log.recent(5).await?;
    if !events.is_empty() {
        println!("\nRecent events:");
        for event in &events {
            println!(
                "  [{}] {} {}",
                event.level.as_str(),
                event.created_at.format("%Y-%m-%d %H:%M"),
                event.message
            );
        }
    }

    Ok(())
}
