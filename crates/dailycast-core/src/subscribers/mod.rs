mod address;
mod models;
mod service;

pub use address::normalize_address;
pub use models::Subscriber;
pub use service::{SubscribeOutcome, SubscriptionService};
