//! Test doubles shared by the cross-module tests.

use crate::embeddings::{EmbeddingProvider, MockProvider};
use crate::model::LanguageModel;
use crate::types::Chunk;
use crate::web::{WebResult, WebSearchTransport};
use async_trait::async_trait;
use notebook_core::{AppError, AppResult};
use notebook_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DIMENSIONS: usize = 64;

pub fn chunk(source: &str, index: usize, text: &str) -> Chunk {
    Chunk {
        source_filename: source.to_string(),
        chunk_index: index,
        start_offset: 0,
        text: text.to_string(),
    }
}

/// Language model that answers from a script, in order, and records prompts.
///
/// `Err` entries are replayed as `ModelUnavailable`; an exhausted script
/// also fails.
#[derive(Debug, Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<&str, &str>>) -> Arc<Self> {
        let replies = replies
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        Arc::new(Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn model(self: &Arc<Self>) -> LanguageModel {
        LanguageModel::new(self.clone(), "scripted")
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("script exhausted".to_string()));

        match reply {
            Ok(content) => Ok(LlmResponse {
                content,
                model: request.model.clone(),
                usage: LlmUsage::default(),
            }),
            Err(message) => Err(AppError::ModelUnavailable(message)),
        }
    }
}

/// Hashing embedder that fails for any text containing `poison`.
#[derive(Debug)]
pub struct SelectiveEmbedder {
    inner: MockProvider,
    poison: String,
}

impl SelectiveEmbedder {
    pub fn new(poison: &str) -> Self {
        Self {
            inner: MockProvider::new(DIMENSIONS),
            poison: poison.to_string(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for SelectiveEmbedder {
    fn provider_name(&self) -> &str {
        "selective"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.contains(&self.poison)) {
            return Err(AppError::EmbeddingUnavailable(format!(
                "refusing to embed '{}'",
                self.poison
            )));
        }
        self.inner.embed_batch(texts).await
    }
}

/// Web transport returning canned results and counting calls.
#[derive(Debug, Default)]
pub struct MockTransport {
    results: Vec<WebResult>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockTransport {
    pub fn with_results(results: Vec<WebResult>) -> Arc<Self> {
        Arc::new(Self {
            results,
            ..Self::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WebSearchTransport for MockTransport {
    async fn text(
        &self,
        _query: &str,
        max_results: usize,
        _region: &str,
        _timeout: Duration,
    ) -> AppResult<Vec<WebResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Transport("connection reset".to_string()));
        }
        Ok(self.results.iter().take(max_results).cloned().collect())
    }
}

pub fn web_result(title: &str, body: &str) -> WebResult {
    WebResult {
        title: title.to_string(),
        href: format!("https://example.com/{}", title.to_lowercase()),
        body: body.to_string(),
    }
}
