mod database;
mod subscriber_repo;
mod article_repo;
mod delivery_repo;
pub mod event_log;

pub use database::Database;
pub use subscriber_repo::SubscriberRepository;
pub use article_repo::ArticleRepository;
pub use delivery_repo::DeliveryRepository;
pub use event_log::{EventLevel, EventSink, SqliteEventLog, SystemEvent};
