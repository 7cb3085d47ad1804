mod service;
pub mod tasks;

pub use service::{parse_time_of_day, Scheduler, Trigger};
pub use tasks::{health_check, refresh_content};
