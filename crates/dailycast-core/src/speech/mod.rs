mod narrator;
mod providers;

pub use narrator::{cleanup_audio_dir, DigestNarrator, Narrator};
pub use providers::{GoogleSpeechProvider, SpeechProvider};
