//! Tests for retrieval ranking correctness.

use super::support::{chunk, ScriptedLlm, DIMENSIONS};
use crate::embeddings::MockProvider;
use crate::rag::{QueryExpander, RetrievalLimits, Retriever};
use crate::vector_index::VectorIndex;
use notebook_prompt::PromptSet;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;

    async fn languages_index(dir: &Path) -> Arc<VectorIndex> {
        let index = VectorIndex::new(dir, Arc::new(MockProvider::new(DIMENSIONS)));
        index
            .add(vec![
                chunk("rust.md", 0, "Rust is a systems programming language"),
                chunk("python.md", 0, "Python is popular for data science"),
                chunk("pasta.md", 0, "Cooking pasta requires boiling water"),
            ])
            .await
            .unwrap();
        Arc::new(index)
    }

    fn limits(chunk_k: usize, k_per_query: usize, multi_query_count: usize) -> RetrievalLimits {
        RetrievalLimits {
            chunk_k,
            k_per_query,
            multi_query_count,
        }
    }

    #[tokio::test]
    async fn test_relevant_chunk_ranks_first() {
        let temp = TempDir::new().unwrap();
        let index = languages_index(temp.path()).await;

        let results = index.search("rust programming language", 3).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.source_filename, "rust.md");
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[tokio::test]
    async fn test_overlapping_sub_queries_yield_unique_citations() {
        let temp = TempDir::new().unwrap();
        let index = languages_index(temp.path()).await;

        let llm = ScriptedLlm::new(vec![Ok("rust programming\nsystems language\nrust")]);
        let prompts = Arc::new(PromptSet::defaults().unwrap());
        let retriever = Retriever::new(
            index,
            QueryExpander::new(Some(llm.model()), prompts),
            limits(5, 3, 3),
        );

        let context = retriever.retrieve("rust language").await;
        assert_eq!(context.queries.len(), 4);
        // every query returns all three chunks; each is cited once
        assert_eq!(context.citations.len(), 3);
        let sources: Vec<&str> = context
            .citations
            .values()
            .map(|c| c.source.as_str())
            .collect();
        assert_eq!(sources[0], "rust.md");
        let mut deduped = sources.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), 3);
        assert_eq!(
            context.citations.keys().copied().collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_chunk_k_caps_context() {
        let temp = TempDir::new().unwrap();
        let index = languages_index(temp.path()).await;
        let prompts = Arc::new(PromptSet::defaults().unwrap());
        let retriever = Retriever::new(index, QueryExpander::new(None, prompts), limits(1, 3, 3));

        let context = retriever.retrieve("rust programming").await;
        assert_eq!(context.citations.len(), 1);
        assert_eq!(context.citations[&1].source, "rust.md");
        assert!(!context.context_text.contains("[2]"));
    }
}
