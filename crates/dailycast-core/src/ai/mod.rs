pub mod providers;
mod summarizer;

pub use summarizer::{language_name, DigestSummarizer, Summarizer};
