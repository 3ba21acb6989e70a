//! Error types for Notebook.
//!
//! A single error enum covers configuration, I/O, the external model and
//! embedding services, index persistence, web search transport, prompts
//! and serialization.

use thiserror::Error;

/// Unified error type for Notebook.
///
/// All fallible functions return `Result<T, AppError>`. External failures are
/// represented and propagated, never turned into panics.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The embedding service could not be reached or returned garbage
    #[error("Embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The language model could not be reached or returned garbage
    #[error("Language model unavailable: {0}")]
    ModelUnavailable(String),

    /// Persisted index files exist but cannot be parsed
    #[error("Corrupt vector index: {0}")]
    CorruptIndex(String),

    /// Web search transport failures
    #[error("Transport error: {0}")]
    Transport(String),

    /// Chunking, indexing and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Short variant name, used in user-facing placeholder messages.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "ConfigError",
            AppError::Io(_) => "IoError",
            AppError::EmbeddingUnavailable(_) => "EmbeddingUnavailableError",
            AppError::ModelUnavailable(_) => "ModelUnavailableError",
            AppError::CorruptIndex(_) => "CorruptIndexError",
            AppError::Transport(_) => "TransportError",
            AppError::Knowledge(_) => "KnowledgeError",
            AppError::Prompt(_) => "PromptError",
            AppError::Serialization(_) => "SerializationError",
            AppError::Other(_) => "Error",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
