pub mod ai;
pub mod config;
pub mod delivery;
pub mod error;
pub mod messaging;
pub mod news;
pub mod scheduler;
pub mod speech;
pub mod storage;
pub mod subscribers;

pub use config::AppConfig;
pub use error::{Error, Result};
