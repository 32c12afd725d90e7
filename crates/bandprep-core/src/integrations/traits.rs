use async_trait::async_trait;

use crate::error::CompletionError;

/// A remote text-completion service.
///
/// One request per call and no retries; callers decide whether to try again.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `prompt` authenticated with `secret` and return the generated text.
    async fn complete(&self, secret: &str, prompt: &str) -> Result<String, CompletionError>;
}
