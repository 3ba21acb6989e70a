//! Whole-document analysis: FAQ, key topics, mind map.

use crate::model::LanguageModel;
use crate::rag::scanner::split_reasoning;
use crate::types::SynthesisResult;
use notebook_core::{AppError, AppResult};
use notebook_prompt::{PromptKind, PromptSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const TRUNCATION_NOTICE: &str = "\n\n... [CONTENT TRUNCATED DUE TO LENGTH LIMIT]";

pub const ONLY_REASONING_ANALYSIS: &str =
    "[Analysis consisted only of reasoning. No final output provided. See thinking process.]";

pub const EMPTY_ANALYSIS: &str = "[Analysis generation resulted in empty content after parsing.]";

pub const NO_MODEL_ANALYSIS: &str = "Error: AI model is not available for analysis.";

/// Supported analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Faq,
    Topics,
    Mindmap,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 3] = [Self::Faq, Self::Topics, Self::Mindmap];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Faq => "faq",
            Self::Topics => "topics",
            Self::Mindmap => "mindmap",
        }
    }

    pub fn prompt_kind(&self) -> PromptKind {
        match self {
            Self::Faq => PromptKind::AnalysisFaq,
            Self::Topics => PromptKind::AnalysisTopics,
            Self::Mindmap => PromptKind::AnalysisMindmap,
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                AppError::Knowledge(format!(
                    "Invalid analysis type '{}'. Expected one of: faq, topics, mindmap",
                    s
                ))
            })
    }
}

/// Runs one analysis prompt over a document's text.
#[derive(Debug, Clone)]
pub struct DocumentAnalyzer {
    model: Option<LanguageModel>,
    prompts: Arc<PromptSet>,
    max_context_chars: usize,
}

impl DocumentAnalyzer {
    pub fn new(
        model: Option<LanguageModel>,
        prompts: Arc<PromptSet>,
        max_context_chars: usize,
    ) -> Self {
        Self {
            model,
            prompts,
            max_context_chars,
        }
    }

    /// Analyze `text` (the content of `filename`). Never fails.
    pub async fn analyze(&self, filename: &str, text: &str, kind: AnalysisKind) -> SynthesisResult {
        let Some(model) = self.model.as_ref() else {
            tracing::error!("Analysis requested but no language model is available");
            return SynthesisResult::placeholder(NO_MODEL_ANALYSIS);
        };

        if text.trim().is_empty() {
            tracing::warn!("Text for '{}' is empty, analysis may not be useful", filename);
        }

        let document_text = truncate_for_analysis(text, self.max_context_chars);
        if document_text.len() != text.len() {
            tracing::warn!(
                "Document '{}' too long, truncated to {} characters for {} analysis",
                filename,
                self.max_context_chars,
                kind
            );
        }

        let prompt = match self
            .prompts
            .get(kind.prompt_kind())
            .render(&[("document_text", document_text.as_str())])
        {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::error!("Failed to render {} analysis prompt: {}", kind, e);
                return SynthesisResult::placeholder(failure_message(e.kind()));
            }
        };

        tracing::info!(%kind, filename, "Running document analysis");
        let raw = match model.invoke(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Analysis of '{}' ({}) failed: {}", filename, kind, e);
                return SynthesisResult::placeholder(failure_message(e.kind()));
            }
        };

        let scanned = split_reasoning(&raw);
        let content = if !scanned.answer.is_empty() {
            scanned.answer
        } else if scanned.reasoning.is_some() {
            tracing::warn!("Analysis of '{}' contained only reasoning", filename);
            ONLY_REASONING_ANALYSIS.to_string()
        } else {
            tracing::error!("Analysis of '{}' was empty after parsing", filename);
            EMPTY_ANALYSIS.to_string()
        };

        SynthesisResult::new(content, scanned.reasoning)
    }
}

fn failure_message(kind: &str) -> String {
    format!("Error generating analysis: AI model failed ({}).", kind)
}

/// Cut `text` to `max_chars` characters, appending the truncation notice.
pub fn truncate_for_analysis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((at, _)) => format!("{}{}", &text[..at], TRUNCATION_NOTICE),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("faq".parse::<AnalysisKind>().unwrap(), AnalysisKind::Faq);
        assert_eq!(
            " MindMap ".parse::<AnalysisKind>().unwrap(),
            AnalysisKind::Mindmap
        );
        assert!("summary".parse::<AnalysisKind>().is_err());
    }

    #[test]
    fn test_truncation() {
        assert_eq!(truncate_for_analysis("short", 10), "short");
        assert_eq!(truncate_for_analysis("exactly10!", 10), "exactly10!");
        assert_eq!(
            truncate_for_analysis("ééééé", 3),
            format!("ééé{}", TRUNCATION_NOTICE)
        );
    }

    #[tokio::test]
    async fn test_no_model() {
        let analyzer = DocumentAnalyzer::new(None, Arc::new(PromptSet::defaults().unwrap()), 100);
        let result = analyzer.analyze("a.md", "text", AnalysisKind::Faq).await;
        assert_eq!(result.answer, NO_MODEL_ANALYSIS);
    }
}
