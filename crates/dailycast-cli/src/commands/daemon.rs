use std::fs;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use dailycast_core::{
    ai::Summarizer,
    delivery::DeliveryDispatcher,
    messaging::WhatsAppGateway,
    news::{NewsApiClient, NewsIngestor},
    scheduler::{health_check, parse_time_of_day, refresh_content, Scheduler, Trigger},
    speech::Narrator,
    storage::{Database, EventLevel, EventSink, SqliteEventLog},
    AppConfig,
};

/// Check if the daemon is running
fn is_daemon_running(config: &AppConfig) -> Option<u32> {
    let pid_path = config.pid_path();
    if !pid_path.exists() {
        return None;
    }

    let mut file = fs::File::open(&pid_path).ok()?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).ok()?;
    let pid: u32 = contents.trim().parse().ok()?;

    // Check if process is still running
    #[cfg(unix)]
    {
        use std::process::Command;
        let output = Command::new("kill")
            .arg("-0")
            .arg(pid.to_string())
            .output()
            .ok()?;
        if output.status.success() {
            return Some(pid);
        }
    }

    #[cfg(windows)]
    {
        // On Windows, just check if PID file exists (simplified)
        return Some(pid);
    }

    // Process not running, clean up stale PID file
    let _ = fs::remove_file(&pid_path);
    None
}

/// Write PID file
fn write_pid_file(config: &AppConfig) -> Result<()> {
    let pid_path = config.pid_path();
    if let Some(parent) = pid_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(&pid_path)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(())
}

/// Remove PID file
fn remove_pid_file(config: &AppConfig) {
    let _ = fs::remove_file(config.pid_path());
}

/// Start the daemon
pub async fn start(db: Database, config: Arc<AppConfig>) -> Result<()> {
    config.validate()?;

    // Check if already running
    if let Some(pid) = is_daemon_running(&config) {
        println!("Daemon is already running (PID: {})", pid);
        return Ok(());
    }

    println!("Starting dailycast daemon...");

    write_pid_file(&config)?;

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Setup signal handler for graceful shutdown
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        let _ = shutdown_tx_clone.send(true);
    });

    // Build the service graph
    let events: Arc<dyn EventSink> = Arc::new(SqliteEventLog::new(db.clone()));
    let provider = Arc::new(NewsApiClient::new(&config)?);
    let ingestor = Arc::new(NewsIngestor::new(
        db.clone(),
        provider,
        events.clone(),
        &config,
    ));
    let summarizer = Arc::new(Summarizer::from_config(&config, events.clone())?);
    let narrator = Arc::new(Narrator::from_config(&config, events.clone())?);
    let gateway = Arc::new(WhatsAppGateway::new(&config)?);

    let dispatcher = Arc::new(DeliveryDispatcher::new(
        db.clone(),
        ingestor.clone(),
        summarizer.clone(),
        narrator.clone(),
        gateway,
        events.clone(),
    ));

    // Register the scheduled jobs
    let delivery_time = parse_time_of_day(&config.schedule.delivery_time)?;
    let cleanup_time = parse_time_of_day(&config.schedule.cleanup_time)?;

    let mut scheduler = Scheduler::new(Duration::from_secs(config.schedule.job_timeout_secs));

    let job_dispatcher = dispatcher.clone();
    scheduler.add_job("daily-delivery", Trigger::DailyAt(delivery_time), move || {
        let dispatcher = job_dispatcher.clone();
        async move {
            if let Err(e) = dispatcher.run().await {
                tracing::error!("Delivery run failed: {}", e);
            }
        }
    });

    let refresh_db = db.clone();
    let refresh_ingestor = ingestor.clone();
    let refresh_summarizer = summarizer.clone();
    let refresh_languages = config.general.languages.clone();
    scheduler.add_job(
        "content-refresh",
        Trigger::Every(Duration::from_secs(
            config.schedule.refresh_interval_hours * 3600,
        )),
        move || {
            let db = refresh_db.clone();
            let ingestor = refresh_ingestor.clone();
            let summarizer = refresh_summarizer.clone();
            let languages = refresh_languages.clone();
            async move {
                if let Err(e) = refresh_content(&db, &ingestor, &summarizer, &languages).await {
                    tracing::error!("Content refresh failed: {}", e);
                }
            }
        },
    );

    let cleanup_narrator = narrator.clone();
    let retention_days = config.schedule.audio_retention_days;
    scheduler.add_job("audio-cleanup", Trigger::DailyAt(cleanup_time), move || {
        let narrator = cleanup_narrator.clone();
        async move {
            if let Err(e) = narrator.cleanup_old_audio(retention_days).await {
                tracing::error!("Audio cleanup failed: {}", e);
            }
        }
    });

    let health_db = db.clone();
    let health_events = events.clone();
    scheduler.add_job(
        "health-check",
        Trigger::Every(Duration::from_secs(config.schedule.health_interval_secs)),
        move || {
            let db = health_db.clone();
            let events = health_events.clone();
            async move {
                if let Err(e) = health_check(&db, events.as_ref()).await {
                    tracing::error!("Health check failed: {}", e);
                }
            }
        },
    );

    events.record(EventLevel::Info, "Daemon started").await;

    println!(
        "Daemon started (PID: {}). Press Ctrl+C or run 'dailycast daemon stop' to stop.",
        std::process::id()
    );
    println!("  Delivery time: {}", config.schedule.delivery_time);
    println!(
        "  Refresh interval: {} hours",
        config.schedule.refresh_interval_hours
    );
    println!(
        "  Audio cleanup: {} ({} day retention)",
        config.schedule.cleanup_time, retention_days
    );

    // Run scheduler (blocks until shutdown)
    scheduler.run(shutdown_rx).await;

    events.record(EventLevel::Info, "Daemon stopped").await;

    remove_pid_file(&config);
    println!("Daemon stopped.");

    Ok(())
}

/// Stop the daemon
pub async fn stop(config: &AppConfig) -> Result<()> {
    match is_daemon_running(config) {
        Some(pid) => {
            println!("Stopping daemon (PID: {})...", pid);

            #[cfg(unix)]
            {
                use std::process::Command;
                let output = Command::new("kill")
                    .arg("-TERM")
                    .arg(pid.to_string())
                    .output()?;

                if output.status.success() {
                    // Wait a moment for graceful shutdown
                    tokio::time::sleep(Duration::from_secs(2)).await;

                    // Check if still running
                    if is_daemon_running(config).is_none() {
                        println!("Daemon stopped successfully.");
                    } else {
                        // Force kill
                        let _ = Command::new("kill")
                            .arg("-9")
                            .arg(pid.to_string())
                            .output();
                        remove_pid_file(config);
                        println!("Daemon forcefully terminated.");
                    }
                } else {
                    println!(
                        "Failed to stop daemon. You may need to kill it manually: kill {}",
                        pid
                    );
                }
            }

            #[cfg(windows)]
            {
                println!("Please stop the daemon manually on Windows (PID: {})", pid);
            }
        }
        None => {
            println!("Daemon is not running.");
        }
    }

    Ok(())
}

/// Show daemon status
pub async fn status(config: &AppConfig) -> Result<()> {
    match is_daemon_running(config) {
        Some(pid) => {
            println!("Daemon is running (PID: {})", pid);
            println!("PID file: {}", config.pid_path().display());
        }
        None => {
            println!("Daemon is not running.");
        }
    }

    Ok(())
}
