//! Chat-completion providers

pub mod groq;

use async_trait::async_trait;

pub use groq::GroqClient;

/// Remote chat-completion capability. One call, one answer;
/// retries and fallback live in the gateway.
#[async_trait]
pub trait CompletionApi: Send + Sync
{   /// Send one request, return the first choice's text
    async fn chat(
      &self
    , request: &crate::request::ChatRequest
    ) -> Result<String, crate::error::Error>;
}
