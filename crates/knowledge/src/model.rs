//! Language model handle used by the pipeline components.

use notebook_core::AppResult;
use notebook_llm::{LlmClient, LlmRequest};
use std::sync::Arc;

/// A client bound to one generation model.
///
/// Components take `Option<LanguageModel>`: `None` means no model is
/// available and each component degrades in its own documented way.
#[derive(Clone)]
pub struct LanguageModel {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl LanguageModel {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    /// Single-turn completion of `prompt`.
    ///
    /// # Errors
    /// Whatever the client reports, normally `AppError::ModelUnavailable`.
    pub async fn invoke(&self, prompt: &str) -> AppResult<String> {
        tracing::debug!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "Invoking language model"
        );
        let response = self
            .client
            .complete(&LlmRequest::new(prompt, self.model.as_str()))
            .await?;
        Ok(response.content)
    }
}

impl std::fmt::Debug for LanguageModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageModel")
            .field("provider", &self.client.provider_name())
            .field("model", &self.model)
            .finish()
    }
}
