//! Multi-query expansion.

use crate::model::LanguageModel;
use notebook_prompt::{PromptKind, PromptSet};
use std::sync::Arc;

/// Turns one user query into an ordered, duplicate-free set of search queries.
///
/// Element 0 of every result is the original query. Expansion never fails:
/// without a model, with `n == 0`, or when the model call fails, the result
/// is just `[query]`.
#[derive(Debug, Clone)]
pub struct QueryExpander {
    model: Option<LanguageModel>,
    prompts: Arc<PromptSet>,
}

impl QueryExpander {
    pub fn new(model: Option<LanguageModel>, prompts: Arc<PromptSet>) -> Self {
        Self { model, prompts }
    }

    /// Expand `query` into itself plus up to `n` model-generated sub-queries.
    pub async fn expand(&self, query: &str, n: usize) -> Vec<String> {
        let Some(model) = self.model.as_ref() else {
            tracing::warn!("No language model available, using original query only");
            return vec![query.to_string()];
        };
        if n == 0 {
            tracing::debug!("Sub-query generation disabled");
            return vec![query.to_string()];
        }

        let count = n.to_string();
        let prompt = match self
            .prompts
            .get(PromptKind::SubQuery)
            .render(&[("query", query), ("num_queries", count.as_str())])
        {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::error!("Failed to render sub-query prompt: {}", e);
                return vec![query.to_string()];
            }
        };

        tracing::info!(n, "Generating sub-queries");
        match model.invoke(&prompt).await {
            Ok(raw) => {
                let queries = build_query_set(query, &raw, n);
                if queries.len() == 1 {
                    tracing::warn!("Model produced no usable sub-queries");
                }
                tracing::debug!(?queries, "Search queries");
                queries
            }
            Err(e) => {
                tracing::error!("Sub-query generation failed, using original query only: {}", e);
                vec![query.to_string()]
            }
        }
    }
}

/// `[query]` followed by the first `n` non-blank lines of `raw`, with exact
/// duplicates removed (first occurrence wins).
pub fn build_query_set(query: &str, raw: &str, n: usize) -> Vec<String> {
    let candidates = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(n);

    let mut queries: Vec<String> = Vec::with_capacity(n + 1);
    for candidate in std::iter::once(query).chain(candidates) {
        if !queries.iter().any(|q| q == candidate) {
            queries.push(candidate.to_string());
        }
    }
    queries
}
