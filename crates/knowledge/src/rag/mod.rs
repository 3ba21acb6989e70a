//! Retrieval-augmented answering.
//!
//! A question flows through [`QueryExpander`] (sub-queries), [`Retriever`]
//! (parallel index searches, dedup, citation-numbered context) and
//! [`ResponseSynthesizer`] (final prompt, reasoning split).

pub mod expander;
pub mod retriever;
pub mod scanner;
pub mod synthesizer;

pub use expander::{build_query_set, QueryExpander};
pub use retriever::{
    assemble_context, select_chunks, RetrievalLimits, Retriever, CONTEXT_SEPARATOR,
    NO_CONTEXT_SENTINEL,
};
pub use scanner::{split_reasoning, ScannedOutput, REASONING_MARKERS};
pub use synthesizer::{parse_model_output, ResponseSynthesizer, NO_MODEL_ANSWER};
