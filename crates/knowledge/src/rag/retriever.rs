//! Multi-query retrieval: expansion, per-query search, cross-query
//! deduplication, ranking and citation-indexed context assembly.

use crate::rag::expander::QueryExpander;
use crate::types::{ChunkKey, CitationEntry, CitationMap, RetrievedContext, ScoredChunk};
use crate::vector_index::VectorIndex;
use futures::future::join_all;
use notebook_core::config::RagSettings;
use std::collections::HashMap;
use std::sync::Arc;

/// Returned as the context text when nothing relevant was retrieved.
pub const NO_CONTEXT_SENTINEL: &str = "No relevant context was found in the available documents.";

/// Separator between formatted context entries (and web results).
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Retrieval budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalLimits {
    /// Unique chunks kept in the final context
    pub chunk_k: usize,
    /// Chunks fetched for each search query
    pub k_per_query: usize,
    /// Sub-queries requested from the expander
    pub multi_query_count: usize,
}

impl RetrievalLimits {
    pub fn from_settings(rag: &RagSettings) -> Self {
        Self {
            chunk_k: rag.chunk_k,
            k_per_query: rag.search_k_per_query.max(1),
            multi_query_count: rag.multi_query_count,
        }
    }
}

impl Default for RetrievalLimits {
    fn default() -> Self {
        Self::from_settings(&RagSettings::default())
    }
}

/// Builds the document context for one question.
#[derive(Debug, Clone)]
pub struct Retriever {
    index: Arc<VectorIndex>,
    expander: QueryExpander,
    limits: RetrievalLimits,
}

impl Retriever {
    pub fn new(index: Arc<VectorIndex>, expander: QueryExpander, limits: RetrievalLimits) -> Self {
        Self {
            index,
            expander,
            limits,
        }
    }

    pub fn limits(&self) -> RetrievalLimits {
        self.limits
    }

    /// Retrieve, deduplicate, rank and format context for `query`.
    ///
    /// Never fails. An empty index, a blank query, or no surviving chunks all
    /// produce [`NO_CONTEXT_SENTINEL`] with an empty citation map. A failed
    /// search for one sub-query is logged and skipped.
    pub async fn retrieve(&self, query: &str) -> RetrievedContext {
        if query.trim().is_empty() {
            tracing::warn!("Retrieval attempted with an empty query");
            return no_context(Vec::new());
        }
        if self.index.is_empty().await {
            tracing::warn!("Retrieval attempted against an empty index");
            return no_context(vec![query.to_string()]);
        }

        let queries = self
            .expander
            .expand(query, self.limits.multi_query_count)
            .await;
        let k = self.limits.k_per_query.max(1);

        tracing::debug!(
            queries = queries.len(),
            k_per_query = k,
            "Searching vector index"
        );

        // join_all yields results in submission order, so aggregation below
        // sees the same sequence a sequential loop would
        let searches = queries.iter().map(|q| self.index.search(q, k));
        let outcomes = join_all(searches).await;

        let mut result_sets = Vec::with_capacity(outcomes.len());
        for (q, outcome) in queries.iter().zip(outcomes) {
            match outcome {
                Ok(results) => {
                    tracing::debug!(query = %q, hits = results.len(), "Sub-query search done");
                    result_sets.push(results);
                }
                Err(e) => tracing::warn!(query = %q, "Search failed, skipping sub-query: {}", e),
            }
        }

        let total: usize = result_sets.iter().map(Vec::len).sum();
        let selected = select_chunks(result_sets, self.limits.chunk_k);
        tracing::info!(
            retrieved = total,
            selected = selected.len(),
            "Retrieved context chunks"
        );

        if selected.is_empty() {
            return no_context(queries);
        }

        let (context_text, citations) = assemble_context(&selected);
        RetrievedContext {
            context_text,
            citations,
            queries,
        }
    }
}

fn no_context(queries: Vec<String>) -> RetrievedContext {
    RetrievedContext {
        context_text: NO_CONTEXT_SENTINEL.to_string(),
        citations: CitationMap::new(),
        queries,
    }
}

/// Merge per-query result sets into the final ranked selection.
///
/// Chunks are identified by `(source_filename, chunk_index)`. A chunk seen
/// more than once keeps its smallest distance and the position of its first
/// sighting, so after the stable sort equal distances stay in first-seen
/// order. At most `chunk_k` chunks are returned, closest first.
pub fn select_chunks(result_sets: Vec<Vec<ScoredChunk>>, chunk_k: usize) -> Vec<ScoredChunk> {
    let mut positions: HashMap<ChunkKey, usize> = HashMap::new();
    let mut unique: Vec<ScoredChunk> = Vec::new();

    for scored in result_sets.into_iter().flatten() {
        match positions.get(&scored.chunk.key()) {
            Some(&pos) => {
                if scored.distance < unique[pos].distance {
                    unique[pos] = scored;
                }
            }
            None => {
                positions.insert(scored.chunk.key(), unique.len());
                unique.push(scored);
            }
        }
    }

    unique.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    unique.truncate(chunk_k);
    unique
}

/// Render the selected chunks with dense 1-based citation indices.
pub fn assemble_context(selected: &[ScoredChunk]) -> (String, CitationMap) {
    let mut parts = Vec::with_capacity(selected.len());
    let mut citations = CitationMap::new();

    for (i, scored) in selected.iter().enumerate() {
        let citation_index = i + 1;
        let chunk = &scored.chunk;
        parts.push(format!(
            "[{}] Source: {} | Chunk Index: {}\n{}",
            citation_index, chunk.source_filename, chunk.chunk_index, chunk.text
        ));
        citations.insert(
            citation_index,
            CitationEntry {
                citation_index,
                source: chunk.source_filename.clone(),
                chunk_index: chunk.chunk_index,
                content: chunk.text.clone(),
            },
        );
    }

    (parts.join(CONTEXT_SEPARATOR), citations)
}
