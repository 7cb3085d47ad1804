use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dailycast_core::{storage::Database, AppConfig};

mod commands;

#[derive(Parser)]
#[command(name = "dailycast")]
#[command(author, version, about = "Daily news digests with AI narration, delivered over WhatsApp")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a subscriber
    Subscribe {
        /// Phone number in any common format
        address: String,
        /// Preferred digest language
        #[arg(short = 'l', long, default_value = "en")]
        language: String,
    },
    /// Deactivate a subscriber
    Unsubscribe {
        /// Phone number in any common format
        address: String,
    },
    /// List all subscribers
    Subscribers,
    /// Flip a subscriber between active and inactive
    Toggle {
        /// Phone number in any common format
        address: String,
    },
    /// Fetch fresh headlines now
    Fetch {
        /// Restrict the fetch to one language
        #[arg(short = 'l', long)]
        language: Option<String>,
    },
    /// Run a delivery round now
    Deliver {
        /// Restrict delivery to one language group
        #[arg(short = 'l', long)]
        language: Option<String>,
    },
    /// Remove audio files past the retention window
    Cleanup,
    /// Show service status
    Status,
    /// Background daemon running the delivery schedule
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
}

#[derive(Subcommand)]
enum DaemonAction {
    /// Start the background daemon
    Start,
    /// Stop the background daemon
    Stop,
    /// Check daemon status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so its log level can seed the filter
    let config = Arc::new(AppConfig::load()?);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    // Initialize database
    let db = Database::new(&config).await?;

    match cli.command {
        Commands::Subscribe { address, language } => {
            commands::subscribe::run(&db, &config, &address, &language).await
        }
        Commands::Unsubscribe { address } => {
            commands::unsubscribe::run(&db, &config, &address).await
        }
        Commands::Subscribers => commands::subscribers::run(&db).await,
        Commands::Toggle { address } => commands::toggle::run(&db, &config, &address).await,
        Commands::Fetch { language } => {
            commands::fetch::run(&db, &config, language.as_deref()).await
        }
        Commands::Deliver { language } => {
            commands::deliver::run(&db, &config, language.as_deref()).await
        }
        Commands::Cleanup => commands::cleanup::run(&db, &config).await,
        Commands::Status => commands::status::run(&db).await,
        Commands::Daemon { action } => match action {
            DaemonAction::Start => commands::daemon::start(db, config).await,
            DaemonAction::Stop => commands::daemon::stop(&config).await,
            DaemonAction::Status => commands::daemon::status(&config).await,
        },
    }
}
