//! Final answer generation.

use crate::model::LanguageModel;
use crate::rag::scanner::split_reasoning;
use crate::types::SynthesisResult;
use notebook_prompt::{PromptKind, PromptSet};
use std::sync::Arc;

/// Substituted for the web context when web search contributed nothing.
pub const WEB_PLACEHOLDER: &str =
    "Web search was not performed or yielded no relevant results for this query.";

pub const ONLY_REASONING_ANSWER: &str =
    "[AI response consisted only of reasoning. No final answer provided. See thinking process.]";

pub const EMPTY_ANSWER: &str = "[AI Response Processing Error: Empty result after parsing]";

pub const NO_MODEL_ANSWER: &str = "Error: The AI model is currently unavailable.";

/// Builds the synthesis prompt, calls the model once and splits its output.
#[derive(Debug, Clone)]
pub struct ResponseSynthesizer {
    model: Option<LanguageModel>,
    prompts: Arc<PromptSet>,
    deep_think: bool,
}

impl ResponseSynthesizer {
    pub fn new(model: Option<LanguageModel>, prompts: Arc<PromptSet>, deep_think: bool) -> Self {
        Self {
            model,
            prompts,
            deep_think,
        }
    }

    fn template_kind(&self) -> PromptKind {
        if self.deep_think {
            PromptKind::DeepThinkSynthesis
        } else {
            PromptKind::Synthesis
        }
    }

    /// Answer `query` from the retrieved context and optional web text.
    ///
    /// Never fails: model errors become a placeholder answer naming the
    /// error kind, with no reasoning.
    pub async fn synthesize(
        &self,
        query: &str,
        context_text: &str,
        web_text: Option<&str>,
    ) -> SynthesisResult {
        let Some(model) = self.model.as_ref() else {
            tracing::error!("Synthesis requested but no language model is available");
            return SynthesisResult::placeholder(NO_MODEL_ANSWER);
        };

        let web_context = web_text
            .filter(|w| !w.trim().is_empty())
            .unwrap_or(WEB_PLACEHOLDER);

        let prompt = match self.prompts.get(self.template_kind()).render(&[
            ("query", query),
            ("context", context_text),
            ("web_search_context", web_context),
        ]) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::error!("Failed to render synthesis prompt: {}", e);
                return SynthesisResult::placeholder(failure_answer(e.kind()));
            }
        };

        tracing::info!(
            kind = %self.template_kind(),
            prompt_chars = prompt.chars().count(),
            "Synthesizing answer"
        );

        match model.invoke(&prompt).await {
            Ok(raw) => parse_model_output(&raw),
            Err(e) => {
                tracing::error!("Answer synthesis failed: {}", e);
                SynthesisResult::placeholder(failure_answer(e.kind()))
            }
        }
    }
}

fn failure_answer(kind: &str) -> String {
    format!(
        "Sorry, I encountered an error while generating the response ({}).",
        kind
    )
}

/// Split raw model output and apply the empty-answer placeholders.
pub fn parse_model_output(raw: &str) -> SynthesisResult {
    let scanned = split_reasoning(raw);

    let answer = if !scanned.answer.is_empty() {
        scanned.answer
    } else if scanned.reasoning.is_some() {
        tracing::warn!("Model output contained only reasoning");
        ONLY_REASONING_ANSWER.to_string()
    } else {
        tracing::warn!("Model output was empty after parsing");
        EMPTY_ANSWER.to_string()
    };

    SynthesisResult::new(answer, scanned.reasoning)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_reasoning() {
        let result = parse_model_output("<thinking>step1</thinking>Final answer here");
        assert_eq!(result.answer, "Final answer here");
        assert_eq!(result.reasoning.as_deref(), Some("step1"));
    }

    #[test]
    fn test_parse_without_delimiters() {
        let raw = "Plain answer with [1] citation.";
        let result = parse_model_output(raw);
        assert_eq!(result.answer, raw);
        assert_eq!(result.reasoning, None);
    }

    #[test]
    fn test_parse_only_reasoning() {
        let result = parse_model_output("<think>hmm</think>");
        assert_eq!(result.answer, ONLY_REASONING_ANSWER);
        assert_eq!(result.reasoning.as_deref(), Some("hmm"));
    }

    #[test]
    fn test_parse_empty() {
        let result = parse_model_output("  <thinking></thinking> ");
        assert_eq!(result.answer, EMPTY_ANSWER);
        assert_eq!(result.reasoning, None);
    }

    #[test]
    fn test_failure_answer_names_kind() {
        assert_eq!(
            failure_answer("ModelUnavailableError"),
            "Sorry, I encountered an error while generating the response (ModelUnavailableError)."
        );
    }

    #[tokio::test]
    async fn test_no_model() {
        let synthesizer =
            ResponseSynthesizer::new(None, Arc::new(PromptSet::defaults().unwrap()), true);
        let result = synthesizer.synthesize("q", "ctx", None).await;
        assert_eq!(result.answer, NO_MODEL_ANSWER);
        assert_eq!(result.reasoning, None);
    }
}
