use anyhow::Result;

use dailycast_core::storage::{Database, SubscriberRepository};

pub async fn run(db: &Database) -> Result<()> {
    let subscribers = SubscriberRepository::new(db).list_all().await?;

    if subscribers.is_empty() {
        println!("No subscribers yet.");
        println!("\nTo add one, run:");
        println!("  dailycast subscribe <phone> -l <language>");
        return Ok(());
    }

    println!("Subscribers ({}):\n", subscribers.len());

    for subscriber in &subscribers {
        let state = if subscriber.is_active {
            "active"
        } else {
            "inactive"
        };

        println!(
            "  {} [{}] ({})",
            subscriber.address, subscriber.language, state
        );
        if let Some(last) = subscriber.last_delivery {
            println!("    Last delivery: {}", last.format("%Y-%m-%d %H:%M"));
        }
        println!("    Since: {}", subscriber.created_at.format("%Y-%m-%d"));
        println!();
    }

    Ok(())
}
