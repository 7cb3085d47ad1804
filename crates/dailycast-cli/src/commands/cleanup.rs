use anyhow::Result;

use dailycast_core::{
    speech::cleanup_audio_dir,
    storage::{Database, SqliteEventLog},
    AppConfig,
};

pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    let days = config.schedule.audio_retention_days;
    println!("Cleaning up audio older than {} days...", days);

    let events = SqliteEventLog::new(db.clone());
    let removed = cleanup_audio_dir(&config.audio_dir(), &events, days).await?;

    if removed > 0 {
        println!("Deleted {} old audio files.", removed);
    } else {
        println!("No audio files to clean up.");
    }

    Ok(())
}
