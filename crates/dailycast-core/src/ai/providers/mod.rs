mod openai;

pub use openai::OpenAiProvider;

use crate::Result;

/// Trait for chat-completion providers
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run one completion: a system persona plus a user prompt
    async fn complete(&self, system: &str, prompt: &str, max_tokens: u32) -> Result<String>;

    /// Get the provider name for logging
    fn name(&self) -> &str;
}
