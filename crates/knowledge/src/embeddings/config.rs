//! Embedding configuration derived from the application config.

use notebook_core::AppConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for one embedding provider instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "ollama" or "mock"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Base URL of the embedding service
    pub base_url: String,

    /// Expected vector dimensions. `None` lets the provider discover it.
    #[serde(default)]
    pub dimensions: Option<usize>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    60
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            model: super::providers::mock::MOCK_MODEL.to_string(),
            base_url: "http://localhost:11434".to_string(),
            dimensions: Some(384),
            timeout_secs: default_timeout(),
        }
    }
}

impl EmbeddingConfig {
    /// Build the embedding settings for the configured provider.
    pub fn from_app_config(config: &AppConfig) -> Self {
        if config.provider == "mock" {
            return Self {
                base_url: config.ollama.base_url.clone(),
                ..Self::default()
            };
        }

        Self {
            provider: config.provider.clone(),
            model: config.ollama.embedding_model.clone(),
            base_url: config.ollama.base_url.clone(),
            dimensions: None,
            timeout_secs: config.ollama.request_timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "mock");
        assert_eq!(config.dimensions, Some(384));
    }

    #[test]
    fn test_from_app_config_ollama() {
        let mut app = AppConfig::default();
        app.ollama.embedding_model = "nomic-embed-text".to_string();
        app.ollama.request_timeout = 30;

        let config = EmbeddingConfig::from_app_config(&app);
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "nomic-embed-text");
        assert_eq!(config.dimensions, None);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_from_app_config_mock() {
        let app = AppConfig {
            provider: "mock".to_string(),
            ..Default::default()
        };
        let config = EmbeddingConfig::from_app_config(&app);
        assert_eq!(config.provider, "mock");
        assert_eq!(config.model, "trigram-v1");
    }
}
