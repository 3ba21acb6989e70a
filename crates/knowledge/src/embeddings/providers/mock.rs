//! Deterministic offline embedding provider.

use crate::embeddings::provider::EmbeddingProvider;
use notebook_core::AppResult;

/// Model name reported by [`MockProvider`].
pub const MOCK_MODEL: &str = "trigram-v1";

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "what", "how", "why", "who", "does", "do",
];

/// Hashing embedder for tests and the offline `mock` provider.
///
/// Each content word contributes to one bucket for the whole word and one
/// bucket per character trigram, weighted by its frequency. The vector is
/// L2-normalized, so texts sharing vocabulary land close together. Not
/// semantic, but deterministic and content-dependent.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
}

impl MockProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, bytes: &[u8], seed: u64) -> usize {
        let hash = bytes
            .iter()
            .fold(seed, |acc, b| acc.wrapping_mul(37).wrapping_add(*b as u64));
        (hash % self.dimensions as u64) as usize
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        let lower = text.to_lowercase();

        let mut word_freq = std::collections::BTreeMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 1 && !STOP_WORDS.contains(w))
        {
            *word_freq.entry(word).or_insert(0u32) += 1;
        }

        for (word, freq) in &word_freq {
            let weight = *freq as f32;
            embedding[self.bucket(word.as_bytes(), 17)] += weight;

            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.bucket(trigram.as_bytes(), 5)] += weight.sqrt() * 0.5;
            }
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }
        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        MOCK_MODEL
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    }

    #[tokio::test]
    async fn test_embed_is_normalized() {
        let provider = MockProvider::new(64);
        let embedding = provider.embed("hello world").await.unwrap();

        assert_eq!(embedding.len(), 64);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = MockProvider::new(384);
        let a = provider.embed("deterministic test").await.unwrap();
        let b = provider.embed("deterministic test").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_is_closer() {
        let provider = MockProvider::new(384);
        let query = provider.embed("What is quantum computing?").await.unwrap();
        let related = provider
            .embed("Quantum computing uses qubits.")
            .await
            .unwrap();
        let unrelated = provider
            .embed("Sourdough bread needs a starter culture.")
            .await
            .unwrap();

        assert!(distance(&query, &related) < distance(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = MockProvider::new(32);
        let embedding = provider.embed("").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_utf8_input() {
        let provider = MockProvider::new(128);
        let embedding = provider
            .embed("Gamedex é um aplicativo 🎮 brasileiro")
            .await
            .unwrap();
        assert_eq!(embedding.len(), 128);
    }
}
