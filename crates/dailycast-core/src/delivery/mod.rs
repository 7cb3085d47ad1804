mod dispatcher;
mod models;

pub use dispatcher::{DeliveryDispatcher, GroupOutcome, RunSummary};
pub use models::{DeliveryRecord, DeliveryStatus, Digest};
