mod gateway;
pub mod templates;

pub use gateway::{MessageGateway, WhatsAppGateway};
