use super::support::{chunk, ScriptedLlm, SelectiveEmbedder, DIMENSIONS};
use crate::embeddings::MockProvider;
use crate::rag::{QueryExpander, RetrievalLimits, Retriever, NO_CONTEXT_SENTINEL};
use crate::vector_index::VectorIndex;
use notebook_prompt::PromptSet;
use std::sync::Arc;
use tempfile::TempDir;

fn prompts() -> Arc<PromptSet> {
    Arc::new(PromptSet::defaults().unwrap())
}

#[tokio::test]
async fn test_empty_index_yields_sentinel() {
    let temp = TempDir::new().unwrap();
    let index = Arc::new(VectorIndex::new(
        temp.path(),
        Arc::new(MockProvider::new(DIMENSIONS)),
    ));
    let llm = ScriptedLlm::new(vec![Ok("should not be asked")]);
    let retriever = Retriever::new(
        index,
        QueryExpander::new(Some(llm.model()), prompts()),
        RetrievalLimits::default(),
    );

    let context = retriever.retrieve("anything").await;
    assert_eq!(context.context_text, NO_CONTEXT_SENTINEL);
    assert!(context.citations.is_empty());
    // no expansion against an empty index
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn test_single_chunk_is_cited() {
    let temp = TempDir::new().unwrap();
    let index = VectorIndex::new(temp.path(), Arc::new(MockProvider::new(DIMENSIONS)));
    index
        .add(vec![chunk("doc.pdf", 0, "Quantum computing uses qubits.")])
        .await
        .unwrap();

    let retriever = Retriever::new(
        Arc::new(index),
        QueryExpander::new(None, prompts()),
        RetrievalLimits::default(),
    );

    let context = retriever.retrieve("What is quantum computing?").await;
    assert_eq!(
        context.context_text,
        "[1] Source: doc.pdf | Chunk Index: 0\nQuantum computing uses qubits."
    );
    assert_eq!(context.citations.len(), 1);
    let entry = &context.citations[&1];
    assert_eq!(entry.citation_index, 1);
    assert_eq!(entry.source, "doc.pdf");
    assert_eq!(entry.chunk_index, 0);
    assert_eq!(entry.content, "Quantum computing uses qubits.");
    assert_eq!(context.queries, vec!["What is quantum computing?"]);
}

#[tokio::test]
async fn test_failed_sub_query_is_skipped() {
    let temp = TempDir::new().unwrap();
    let index = VectorIndex::new(temp.path(), Arc::new(SelectiveEmbedder::new("poison")));
    index
        .add(vec![
            chunk("qc.md", 0, "Quantum computing uses qubits."),
            chunk("qc.md", 1, "Qubit hardware needs cooling."),
        ])
        .await
        .unwrap();

    let llm = ScriptedLlm::new(vec![Ok("poison pill query\nqubit hardware")]);
    let retriever = Retriever::new(
        Arc::new(index),
        QueryExpander::new(Some(llm.model()), prompts()),
        RetrievalLimits::default(),
    );

    let context = retriever.retrieve("quantum computing").await;
    assert_eq!(
        context.queries,
        vec!["quantum computing", "poison pill query", "qubit hardware"]
    );
    assert_eq!(context.citations.len(), 2);
    assert_ne!(context.context_text, NO_CONTEXT_SENTINEL);
}

#[tokio::test]
async fn test_expansion_failure_falls_back_to_query() {
    let temp = TempDir::new().unwrap();
    let index = VectorIndex::new(temp.path(), Arc::new(MockProvider::new(DIMENSIONS)));
    index
        .add(vec![chunk("qc.md", 0, "Quantum computing uses qubits.")])
        .await
        .unwrap();

    let llm = ScriptedLlm::new(vec![Err("model offline")]);
    let retriever = Retriever::new(
        Arc::new(index),
        QueryExpander::new(Some(llm.model()), prompts()),
        RetrievalLimits::default(),
    );

    let context = retriever.retrieve("qubits").await;
    assert_eq!(context.queries, vec!["qubits"]);
    assert_eq!(context.citations.len(), 1);
    assert_eq!(llm.prompts().len(), 1);
}
