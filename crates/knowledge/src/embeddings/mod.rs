//! Embedding service.
//!
//! Maps text to fixed-length vectors through a provider-agnostic trait. The
//! vector index only ever talks to `dyn EmbeddingProvider`.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{MockProvider, OllamaProvider};
