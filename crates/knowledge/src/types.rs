//! Domain types shared across the knowledge pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A bounded slice of a source document, tagged with provenance.
///
/// Immutable once produced by the chunker; the vector index owns it after
/// indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Filename of the document the chunk was cut from
    pub source_filename: String,

    /// Position of the chunk within its document, starting at 0
    pub chunk_index: usize,

    /// Character (not byte) offset of the chunk's first character in the source
    pub start_offset: usize,

    pub text: String,
}

impl Chunk {
    /// Identity used to deduplicate retrieval results.
    pub fn key(&self) -> ChunkKey {
        ChunkKey {
            source: self.source_filename.clone(),
            chunk_index: self.chunk_index,
        }
    }
}

/// Canonical chunk identity: `(source_filename, chunk_index)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub source: String,
    pub chunk_index: usize,
}

/// A chunk returned by a nearest-neighbour search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,

    /// Squared L2 distance to the query; smaller is more similar
    pub distance: f32,
}

/// One entry of the citation map handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationEntry {
    /// Dense 1-based index matching the `[N]` marker in the context text
    pub citation_index: usize,
    pub source: String,
    pub chunk_index: usize,
    pub content: String,
}

/// Citation index to entry, iterated in citation order.
pub type CitationMap = BTreeMap<usize, CitationEntry>;

/// Output of the retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    /// Formatted context, or the no-context sentinel
    pub context_text: String,

    pub citations: CitationMap,

    /// Queries actually searched, original first
    pub queries: Vec<String>,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.citations.is_empty()
    }
}

/// A model answer split into its user-facing part and reasoning trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub answer: String,
    pub reasoning: Option<String>,
}

impl SynthesisResult {
    pub fn new(answer: impl Into<String>, reasoning: Option<String>) -> Self {
        Self {
            answer: answer.into(),
            reasoning,
        }
    }

    /// A placeholder answer with no reasoning.
    pub fn placeholder(answer: impl Into<String>) -> Self {
        Self::new(answer, None)
    }
}

/// Everything the caller gets back for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAnswer {
    pub answer: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    /// Citation map for rendering `[N]` markers
    pub context_docs_map: CitationMap,

    /// Raw web search text, when web search contributed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_results: Option<String>,

    /// Queries searched against the index
    pub sub_queries: Vec<String>,
}

/// Result of ingesting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub filename: String,
    pub chunks: usize,
    pub characters: usize,
    /// Whether the index was written to disk afterwards
    pub persisted: bool,
}

/// Snapshot of the notebook's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookStatus {
    pub provider: String,
    pub embedding_model: String,
    pub vectors: usize,
    pub sources: Vec<String>,
    pub documents_cached: usize,
    pub model_available: bool,
    pub web_search_enabled: bool,
}
