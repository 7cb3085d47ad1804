pub mod cleanup;
pub mod daemon;
pub mod deliver;
pub mod fetch;
pub mod status;
pub mod subscribe;
pub mod subscribers;
pub mod toggle;
pub mod unsubscribe;
