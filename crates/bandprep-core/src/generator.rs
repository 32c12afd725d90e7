//! Fresh task prompts from the completion service.

use std::sync::Arc;

use tracing::info;

use crate::error::CompletionError;
use crate::integrations::CompletionClient;
use crate::prompts;
use crate::task::TaskKind;

pub struct TaskGenerator {
    client: Arc<dyn CompletionClient>,
}

impl TaskGenerator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Ask for a new task of `kind` and return its trimmed text.
    pub async fn generate(&self, secret: &str, kind: TaskKind) -> Result<String, CompletionError> {
        let text = self
            .client
            .complete(secret, prompts::generation_prompt(kind))
            .await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(CompletionError::MalformedResponse(
                "generated task is empty".into(),
            ));
        }
        info!(kind = %kind, chars = text.len(), "task generated");
        Ok(text.to_string())
    }
}
