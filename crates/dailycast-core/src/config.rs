use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub messaging: MessagingConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            news: NewsConfig::default(),
            ai: AiConfig::default(),
            speech: SpeechConfig::default(),
            messaging: MessagingConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Base URL under which generated audio is publicly reachable
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Languages served by the daily digest
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Request timeout in seconds for outbound provider calls
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            public_base_url: default_public_base_url(),
            languages: default_languages(),
            request_timeout_secs: default_timeout(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    /// News provider API key
    #[serde(default)]
    pub api_key: Option<String>,
    /// News provider base URL
    #[serde(default = "default_news_base_url")]
    pub base_url: String,
    /// Country code for top headlines
    #[serde(default = "default_country")]
    pub country: String,
    /// Categories fetched on each refresh; the first is the default category
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    /// Headlines requested per category on refresh
    #[serde(default = "default_articles_per_category")]
    pub articles_per_category: u32,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_news_base_url(),
            country: default_country(),
            categories: default_categories(),
            articles_per_category: default_articles_per_category(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key
    #[serde(default)]
    pub api_key: Option<String>,
    /// OpenAI model name
    #[serde(default = "default_openai_model")]
    pub model: String,
    /// Hard ceiling in seconds for a single completion call
    #[serde(default = "default_ai_timeout")]
    pub completion_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            completion_timeout_secs: default_ai_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Text-to-speech provider API key
    #[serde(default)]
    pub api_key: Option<String>,
    /// Text-to-speech provider base URL
    #[serde(default = "default_speech_base_url")]
    pub base_url: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_speech_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Messaging provider access token
    #[serde(default)]
    pub access_token: Option<String>,
    /// Sender phone number id registered with the provider
    #[serde(default)]
    pub phone_id: Option<String>,
    /// Messaging provider base URL
    #[serde(default = "default_messaging_base_url")]
    pub base_url: String,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_id: None,
            base_url: default_messaging_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Local time of the daily digest delivery, "HH:MM"
    #[serde(default = "default_delivery_time")]
    pub delivery_time: String,
    /// Hours between content refresh runs
    #[serde(default = "default_refresh_hours")]
    pub refresh_interval_hours: u64,
    /// Local time of the daily audio cleanup, "HH:MM"
    #[serde(default = "default_cleanup_time")]
    pub cleanup_time: String,
    /// Seconds between health checks
    #[serde(default = "default_health_interval")]
    pub health_interval_secs: u64,
    /// Days generated audio is kept before cleanup removes it
    #[serde(default = "default_audio_retention_days")]
    pub audio_retention_days: u32,
    /// Ceiling in seconds for a single scheduled job run
    #[serde(default = "default_job_timeout")]
    pub job_timeout_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            delivery_time: default_delivery_time(),
            refresh_interval_hours: default_refresh_hours(),
            cleanup_time: default_cleanup_time(),
            health_interval_secs: default_health_interval(),
            audio_retention_days: default_audio_retention_days(),
            job_timeout_secs: default_job_timeout(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dailycast")
}

fn default_public_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_languages() -> Vec<String> {
    ["en", "es", "fr", "de", "pt"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_news_base_url() -> String {
    "https://newsapi.org/v2".to_string()
}

fn default_country() -> String {
    "us".to_string()
}

fn default_categories() -> Vec<String> {
    ["general", "business", "technology", "sports", "entertainment"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_articles_per_category() -> u32 {
    5
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_ai_timeout() -> u64 {
    120
}

fn default_speech_base_url() -> String {
    "https://texttospeech.googleapis.com/v1".to_string()
}

fn default_messaging_base_url() -> String {
    "https://graph.facebook.com/v17.0".to_string()
}

fn default_delivery_time() -> String {
    "07:30".to_string()
}

fn default_refresh_hours() -> u64 {
    6
}

fn default_cleanup_time() -> String {
    "02:00".to_string()
}

fn default_health_interval() -> u64 {
    3600
}

fn default_audio_retention_days() -> u32 {
    7
}

fn default_job_timeout() -> u64 {
    1800 // 30 minutes
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from file or return defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/dailycast/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("dailycast")
            .join("config.toml")
    }

    /// Get the database file path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("dailycast.db")
    }

    /// Get the directory generated audio is written to
    pub fn audio_dir(&self) -> PathBuf {
        self.data_dir().join("audio")
    }

    /// Get the daemon PID file path
    pub fn pid_path(&self) -> PathBuf {
        self.data_dir().join("dailycast.pid")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }

    /// Check that every provider credential the pipeline needs is present.
    /// Called before the daemon or any provider-reaching command starts.
    pub fn validate(&self) -> crate::Result<()> {
        if self.news.api_key.is_none() {
            return Err(crate::Error::Config(
                "news.api_key is not set; add it to config.toml".to_string(),
            ));
        }
        if self.ai.api_key.is_none() {
            return Err(crate::Error::Config(
                "ai.api_key is not set; add it to config.toml".to_string(),
            ));
        }
        if self.speech.api_key.is_none() {
            return Err(crate::Error::Config(
                "speech.api_key is not set; add it to config.toml".to_string(),
            ));
        }
        self.validate_messaging()
    }

    /// Check the messaging credentials alone, for commands that only send
    pub fn validate_messaging(&self) -> crate::Result<()> {
        if self.messaging.access_token.is_none() {
            return Err(crate::Error::Config(
                "messaging.access_token is not set; add it to config.toml".to_string(),
            ));
        }
        if self.messaging.phone_id.is_none() {
            return Err(crate::Error::Config(
                "messaging.phone_id is not set; add it to config.toml".to_string(),
            ));
        }
        Ok(())
    }
}
