//! Prompt kinds and override file format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every template the pipeline knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptKind {
    /// Decompose a question into search queries
    SubQuery,
    /// Standard answer synthesis
    Synthesis,
    /// Three-phase (factual, conceptual, practical) answer synthesis
    DeepThinkSynthesis,
    AnalysisFaq,
    AnalysisTopics,
    AnalysisMindmap,
}

impl PromptKind {
    pub const ALL: [PromptKind; 6] = [
        PromptKind::SubQuery,
        PromptKind::Synthesis,
        PromptKind::DeepThinkSynthesis,
        PromptKind::AnalysisFaq,
        PromptKind::AnalysisTopics,
        PromptKind::AnalysisMindmap,
    ];

    /// Stable identifier, also used in override files.
    pub fn id(&self) -> &'static str {
        match self {
            PromptKind::SubQuery => "sub-query",
            PromptKind::Synthesis => "synthesis",
            PromptKind::DeepThinkSynthesis => "deep-think-synthesis",
            PromptKind::AnalysisFaq => "analysis-faq",
            PromptKind::AnalysisTopics => "analysis-topics",
            PromptKind::AnalysisMindmap => "analysis-mindmap",
        }
    }

    /// Keys every template of this kind must reference, and the only keys
    /// callers supply when rendering it.
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            PromptKind::SubQuery => &["query", "num_queries"],
            PromptKind::Synthesis | PromptKind::DeepThinkSynthesis => {
                &["query", "context", "web_search_context"]
            }
            PromptKind::AnalysisFaq | PromptKind::AnalysisTopics | PromptKind::AnalysisMindmap => {
                &["document_text"]
            }
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A template override loaded from YAML.
///
/// ```yaml
/// kind: sub-query
/// description: Shorter decomposition prompt
/// template: |
///   Write {{num_queries}} search queries for: {{query}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptOverride {
    pub kind: PromptKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Template string with Handlebars syntax
    pub template: String,
}
