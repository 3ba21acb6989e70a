//! Cross-module tests for the knowledge pipeline.

mod support;

mod rag_ranking;
mod retrieval_flow;
