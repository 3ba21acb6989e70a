//! Notebook knowledge pipeline.
//!
//! Documents are cleaned, chunked and embedded into a local vector index.
//! Questions are expanded into sub-queries, answered from the retrieved
//! chunks (optionally enriched with web results) and returned with a
//! citation map. Whole documents can also be analyzed into an FAQ, key
//! topics or a mind map.

pub mod analysis;
pub mod chunker;
pub mod embeddings;
pub mod library;
pub mod model;
pub mod notebook;
pub mod parser;
pub mod rag;
pub mod types;
pub mod vector_index;
pub mod web;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use analysis::AnalysisKind;
pub use chunker::{ChunkConfig, ChunkingEngine};
pub use embeddings::{EmbeddingConfig, EmbeddingProvider};
pub use model::LanguageModel;
pub use notebook::{Notebook, NotebookParts};
pub use types::{
    ChatAnswer, Chunk, ChunkKey, CitationEntry, CitationMap, IngestReport, NotebookStatus,
    RetrievedContext, ScoredChunk, SynthesisResult,
};
pub use vector_index::VectorIndex;
pub use web::{WebSearchClient, WebSearchTransport};
