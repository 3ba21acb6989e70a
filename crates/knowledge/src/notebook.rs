//! The assembled pipeline.

use crate::analysis::{AnalysisKind, DocumentAnalyzer};
use crate::chunker::{ChunkConfig, ChunkingEngine};
use crate::embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
use crate::library::DocumentLibrary;
use crate::model::LanguageModel;
use crate::parser;
use crate::rag::{QueryExpander, ResponseSynthesizer, RetrievalLimits, Retriever};
use crate::types::{ChatAnswer, IngestReport, NotebookStatus, SynthesisResult};
use crate::vector_index::VectorIndex;
use crate::web::{Clock, DuckDuckGoTransport, SystemClock, WebSearchClient, WebSearchTransport};
use notebook_core::{AppConfig, AppError, AppResult};
use notebook_prompt::PromptSet;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Everything [`Notebook::from_parts`] needs besides the config.
pub struct NotebookParts {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub model: Option<LanguageModel>,
    pub transport: Arc<dyn WebSearchTransport>,
    pub clock: Arc<dyn Clock>,
}

/// One notebook: a vector index, its documents and the components that
/// answer questions over them.
///
/// # Example
/// ```no_run
/// use notebook_core::AppConfig;
/// use notebook_knowledge::Notebook;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AppConfig::load()?;
/// let notebook = Notebook::initialize(&config).await?;
/// notebook.ingest("qc.md", "Quantum computing uses qubits.").await?;
/// let answer = notebook.ask("What is quantum computing?", false).await;
/// println!("{}", answer.answer);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Notebook {
    provider: String,
    index: Arc<VectorIndex>,
    chunker: ChunkingEngine,
    retriever: Retriever,
    synthesizer: ResponseSynthesizer,
    analyzer: DocumentAnalyzer,
    web: WebSearchClient,
    library: Mutex<DocumentLibrary>,
    model: Option<LanguageModel>,
}

impl Notebook {
    /// Build every component from `config`.
    ///
    /// An unreachable language model is logged and leaves the notebook
    /// without a model. An unreachable embedding service, a corrupt index or
    /// an invalid prompt override is an error.
    pub async fn initialize(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;
        tracing::info!(provider = %config.provider, "Initializing notebook");

        let embedder = create_provider(&EmbeddingConfig::from_app_config(config)).await?;
        let model = connect_model(config).await?;

        Self::from_parts(
            config,
            NotebookParts {
                embedder,
                model,
                transport: Arc::new(DuckDuckGoTransport::new()),
                clock: Arc::new(SystemClock),
            },
        )
        .await
    }

    /// Like [`initialize`](Self::initialize), but deletes the persisted index
    /// before loading it. Recovers from an index that is corrupt or was built
    /// with a different embedding dimension.
    pub async fn initialize_fresh(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;
        tracing::info!(provider = %config.provider, "Initializing notebook with a fresh index");

        let embedder = create_provider(&EmbeddingConfig::from_app_config(config)).await?;
        let model = connect_model(config).await?;

        Self::from_parts_fresh(
            config,
            NotebookParts {
                embedder,
                model,
                transport: Arc::new(DuckDuckGoTransport::new()),
                clock: Arc::new(SystemClock),
            },
        )
        .await
    }

    /// Build a notebook around externally supplied services.
    pub async fn from_parts(config: &AppConfig, parts: NotebookParts) -> AppResult<Self> {
        Self::assemble(config, parts, false).await
    }

    /// [`from_parts`](Self::from_parts) with the persisted index deleted first.
    pub async fn from_parts_fresh(config: &AppConfig, parts: NotebookParts) -> AppResult<Self> {
        Self::assemble(config, parts, true).await
    }

    async fn assemble(config: &AppConfig, parts: NotebookParts, reset: bool) -> AppResult<Self> {
        let prompts = Arc::new(PromptSet::load(&config.prompts_dir())?);
        let chunker = ChunkingEngine::new(ChunkConfig::new(
            config.rag.chunk_size,
            config.rag.chunk_overlap,
        ))?;

        let index = Arc::new(VectorIndex::new(config.index_dir(), parts.embedder));
        if reset {
            index.reset().await?;
        }
        if !index.load().await? {
            tracing::info!("Starting with an empty index");
        }

        let mut library = DocumentLibrary::new(config.docs_dir(), config.upload_dir());
        library.refresh();

        let expander = QueryExpander::new(parts.model.clone(), prompts.clone());
        let retriever = Retriever::new(
            index.clone(),
            expander,
            RetrievalLimits::from_settings(&config.rag),
        );

        Ok(Self {
            provider: config.provider.clone(),
            chunker,
            retriever,
            synthesizer: ResponseSynthesizer::new(
                parts.model.clone(),
                prompts.clone(),
                config.deep_think,
            ),
            analyzer: DocumentAnalyzer::new(
                parts.model.clone(),
                prompts,
                config.rag.analysis_max_context_length,
            ),
            web: WebSearchClient::with_clock(
                config.web_search.clone(),
                parts.transport,
                parts.clock,
            ),
            library: Mutex::new(library),
            model: parts.model,
            index,
        })
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Clean, chunk, embed and persist one document.
    ///
    /// Chunks previously indexed under the same filename are replaced.
    ///
    /// # Errors
    /// `AppError::EmbeddingUnavailable` if the document could not be
    /// embedded; I/O errors if the index could not be written.
    pub async fn ingest(&self, filename: &str, text: &str) -> AppResult<IngestReport> {
        let cleaned = parser::clean_text(text);
        let chunks = self.chunker.chunk(&cleaned, filename);
        let characters = cleaned.chars().count();

        if chunks.is_empty() {
            tracing::warn!("Document '{}' has no text, nothing indexed", filename);
            let removed = self.index.replace_source(filename, Vec::new()).await?;
            let persisted = removed > 0 && self.index.save().await?;
            self.library.lock().await.forget(filename);
            return Ok(IngestReport {
                filename: filename.to_string(),
                chunks: 0,
                characters,
                persisted,
            });
        }

        let count = chunks.len();
        let replaced = self.index.replace_source(filename, chunks).await?;
        if replaced > 0 {
            tracing::info!("Replaced {} chunks previously indexed for '{}'", replaced, filename);
        }
        let persisted = self.index.save().await?;

        self.library.lock().await.remember(filename, &cleaned);

        tracing::info!(
            filename,
            chunks = count,
            characters,
            "Ingested document"
        );
        Ok(IngestReport {
            filename: filename.to_string(),
            chunks: count,
            characters,
            persisted,
        })
    }

    /// Read a plain-text or Markdown file and ingest it under its file name.
    pub async fn ingest_path(&self, path: &Path) -> AppResult<IngestReport> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::Knowledge(format!("Invalid document path: {:?}", path)))?;
        let text = parser::parse_file(path)?;
        self.ingest(filename, &text).await
    }

    /// Ingest every document in the default and upload folders.
    ///
    /// Unreadable files are skipped; an embedding failure stops the run.
    pub async fn ingest_library(&self) -> AppResult<Vec<IngestReport>> {
        let paths = self.library.lock().await.document_paths();
        let mut seen = HashSet::new();
        let mut reports = Vec::new();

        for path in paths {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !seen.insert(name.to_string()) {
                tracing::debug!("Skipping duplicate document name {:?}", path);
                continue;
            }
            match self.ingest_path(&path).await {
                Ok(report) => reports.push(report),
                Err(e @ AppError::EmbeddingUnavailable(_)) => return Err(e),
                Err(e) => tracing::warn!("Skipping {:?}: {}", path, e),
            }
        }
        Ok(reports)
    }

    /// Answer `query` from the documents and, when `use_web` is set, the web.
    ///
    /// Never fails; degraded paths show up as placeholder text.
    pub async fn ask(&self, query: &str, use_web: bool) -> ChatAnswer {
        tracing::info!(use_web, "Answering question");

        let web = async {
            if use_web {
                self.web.search(query).await
            } else {
                None
            }
        };
        let (retrieved, web_results) = tokio::join!(self.retriever.retrieve(query), web);

        let synthesis = self
            .synthesizer
            .synthesize(query, &retrieved.context_text, web_results.as_deref())
            .await;

        ChatAnswer {
            answer: synthesis.answer,
            reasoning: synthesis.reasoning,
            context_docs_map: retrieved.citations,
            web_results,
            sub_queries: retrieved.queries,
        }
    }

    /// Run an analysis over a known document. Never fails.
    pub async fn analyze(&self, filename: &str, kind: AnalysisKind) -> SynthesisResult {
        let text = self.library.lock().await.text_for(filename);
        match text {
            Ok(Some(text)) => self.analyzer.analyze(filename, &text, kind).await,
            Ok(None) => {
                tracing::error!("Document '{}' not found for analysis", filename);
                SynthesisResult::placeholder(format!("Error: Document '{}' not found.", filename))
            }
            Err(e) => {
                tracing::error!("Failed to read '{}' for analysis: {}", filename, e);
                SynthesisResult::placeholder(format!(
                    "Error: Could not extract text content from '{}'.",
                    filename
                ))
            }
        }
    }

    /// Raw formatted web results for `query`.
    pub async fn web_search(&self, query: &str) -> Option<String> {
        self.web.search(query).await
    }

    pub async fn status(&self) -> NotebookStatus {
        NotebookStatus {
            provider: self.provider.clone(),
            embedding_model: self.index.embedder().model_name().to_string(),
            vectors: self.index.len().await,
            sources: self.index.sources().await,
            documents_cached: self.library.lock().await.cached(),
            model_available: self.model.is_some(),
            web_search_enabled: self.web.is_enabled(),
        }
    }

    /// Drop every chunk of `filename` from the index and persist the result.
    /// Returns how many chunks were removed.
    pub async fn remove_document(&self, filename: &str) -> AppResult<usize> {
        let removed = self.index.remove_source(filename).await;
        if removed > 0 {
            self.index.save().await?;
            tracing::info!("Removed {} chunks of '{}' from the index", removed, filename);
        } else {
            tracing::warn!("Document '{}' is not in the index", filename);
        }
        self.library.lock().await.forget(filename);
        Ok(removed)
    }

    /// Delete the index from memory and disk.
    pub async fn reset_index(&self) -> AppResult<()> {
        self.index.reset().await
    }
}

/// The configured generation model, or `None` when it is unavailable.
async fn connect_model(config: &AppConfig) -> AppResult<Option<LanguageModel>> {
    if config.provider == "mock" {
        tracing::info!("Provider 'mock' has no language model");
        return Ok(None);
    }

    let client = notebook_llm::create_client(
        &config.provider,
        Some(&config.ollama.base_url),
        Duration::from_secs(config.ollama.request_timeout),
    )?;

    match client.health_check().await {
        Ok(()) => {
            tracing::info!(model = %config.model, "Language model ready");
            Ok(Some(LanguageModel::new(client, config.model.clone())))
        }
        Err(e) => {
            tracing::warn!("Language model unavailable, continuing without it: {}", e);
            Ok(None)
        }
    }
}
