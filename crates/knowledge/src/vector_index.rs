//! Persistent flat vector index over chunk embeddings.
//!
//! The index lives in a directory holding two files that are only valid
//! together:
//!
//! - `index.vec`: magic `NBVI`, u32 format version, u32 dimension, u64 vector
//!   count, then `count * dimension` little-endian f32 values.
//! - `index.json`: [`IndexMetadata`] with the chunk list (in vector order) and
//!   a SHA-256 of `index.vec`.
//!
//! Search is exact (squared L2 over every vector). All state sits behind a
//! tokio `RwLock`; embedding happens before the lock is taken so a slow
//! embedding service never blocks readers.

use crate::embeddings::EmbeddingProvider;
use crate::types::{Chunk, ScoredChunk};
use notebook_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

pub const VECTORS_FILE: &str = "index.vec";
pub const METADATA_FILE: &str = "index.json";

const MAGIC: &[u8; 4] = b"NBVI";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Contents of `index.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMetadata {
    pub version: u32,
    pub dimension: usize,
    pub embedding_model: String,
    /// Hex SHA-256 of `index.vec`
    pub checksum: String,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Default)]
struct IndexState {
    /// In-memory contents match the files on disk
    synced: bool,
    dimension: Option<usize>,
    /// Row-major, `chunks.len() * dimension` values
    vectors: Vec<f32>,
    chunks: Vec<Chunk>,
}

impl IndexState {
    fn row(&self, i: usize, dim: usize) -> &[f32] {
        &self.vectors[i * dim..(i + 1) * dim]
    }
}

/// Nearest-neighbour store that owns the chunk/embedding association.
#[derive(Debug)]
pub struct VectorIndex {
    dir: PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
    state: RwLock<IndexState>,
}

impl VectorIndex {
    pub fn new(dir: impl Into<PathBuf>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            dir: dir.into(),
            embedder,
            state: RwLock::new(IndexState::default()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Load the persisted index.
    ///
    /// Returns `Ok(false)` when either file is missing. Loading an index that
    /// is already in sync with disk is a no-op returning `Ok(true)`.
    ///
    /// # Errors
    /// `AppError::CorruptIndex` when the files exist but do not form a valid
    /// index; `AppError::Knowledge` when the index was built with a vector
    /// dimension the current embedder does not produce.
    pub async fn load(&self) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if state.synced {
            return Ok(true);
        }

        let vec_path = self.dir.join(VECTORS_FILE);
        let meta_path = self.dir.join(METADATA_FILE);
        if !vec_path.is_file() || !meta_path.is_file() {
            tracing::info!("No persisted index at {:?}", self.dir);
            return Ok(false);
        }

        let bytes = fs::read(&vec_path)?;
        let meta_text = fs::read_to_string(&meta_path)?;
        let metadata: IndexMetadata = serde_json::from_str(&meta_text).map_err(|e| {
            AppError::CorruptIndex(format!("Unreadable {:?}: {}", meta_path, e))
        })?;

        let checksum = hex_digest(&bytes);
        if checksum != metadata.checksum {
            return Err(AppError::CorruptIndex(format!(
                "Checksum mismatch for {:?}: metadata says {}, file hashes to {}",
                vec_path, metadata.checksum, checksum
            )));
        }

        let (dimension, vectors) = decode_vectors(&bytes)?;
        let count = if dimension == 0 { 0 } else { vectors.len() / dimension };
        if dimension != metadata.dimension || count != metadata.chunks.len() {
            return Err(AppError::CorruptIndex(format!(
                "{:?} holds {} vectors of dimension {}, metadata lists {} chunks of dimension {}",
                vec_path,
                count,
                dimension,
                metadata.chunks.len(),
                metadata.dimension
            )));
        }

        if dimension != self.embedder.dimensions() {
            return Err(AppError::Knowledge(format!(
                "Index at {:?} was built with {}-dimensional embeddings ({}), current model '{}' produces {}. Reset the index and re-ingest.",
                self.dir,
                dimension,
                metadata.embedding_model,
                self.embedder.model_name(),
                self.embedder.dimensions()
            )));
        }
        if metadata.embedding_model != self.embedder.model_name() {
            tracing::warn!(
                "Index was built with embedding model '{}', now using '{}'",
                metadata.embedding_model,
                self.embedder.model_name()
            );
        }

        tracing::info!(vectors = count, dimension, "Loaded vector index from {:?}", self.dir);

        *state = IndexState {
            synced: true,
            dimension: Some(dimension),
            vectors,
            chunks: metadata.chunks,
        };
        Ok(true)
    }

    /// Embed `chunks` and append them to the index.
    ///
    /// The index is created lazily by the first insertion. The caller must
    /// [`save`](Self::save) afterwards or the additions are lost on restart.
    ///
    /// # Errors
    /// `AppError::EmbeddingUnavailable` if embedding fails; nothing is added
    /// in that case.
    pub async fn add(&self, chunks: Vec<Chunk>) -> AppResult<()> {
        self.insert(chunks, None).await.map(|_| ())
    }

    /// Embed `chunks` and swap them in for every chunk already indexed from
    /// `source`. Returns how many old chunks were dropped.
    ///
    /// The old chunks stay in place if embedding fails.
    pub async fn replace_source(&self, source: &str, chunks: Vec<Chunk>) -> AppResult<usize> {
        self.insert(chunks, Some(source)).await
    }

    /// Drop every chunk that came from `source`. Returns how many were removed.
    pub async fn remove_source(&self, source: &str) -> usize {
        let mut state = self.state.write().await;
        retain_except(&mut state, source)
    }

    async fn insert(&self, chunks: Vec<Chunk>, replacing: Option<&str>) -> AppResult<usize> {
        let embeddings = if chunks.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            self.embedder.embed_batch(&texts).await?
        };
        if embeddings.len() != chunks.len() {
            return Err(AppError::EmbeddingUnavailable(format!(
                "Requested {} embeddings, received {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut state = self.state.write().await;
        if let Some(first) = embeddings.first() {
            let dim = state.dimension.unwrap_or(first.len());
            if let Some(bad) = embeddings.iter().find(|e| e.len() != dim || dim == 0) {
                return Err(AppError::Knowledge(format!(
                    "Embedding dimension mismatch: index uses {}, got {}",
                    dim,
                    bad.len()
                )));
            }
            state.dimension = Some(dim);
        }

        let removed = match replacing {
            Some(source) => retain_except(&mut state, source),
            None => 0,
        };

        if !chunks.is_empty() {
            for embedding in &embeddings {
                state.vectors.extend_from_slice(embedding);
            }
            state.chunks.extend(chunks);
            state.synced = false;
        }

        tracing::debug!(
            added = embeddings.len(),
            removed,
            total = state.chunks.len(),
            "Updated vector index"
        );
        Ok(removed)
    }

    /// The `k` chunks nearest to `query_text`, closest first.
    ///
    /// An empty index yields an empty result without calling the embedder.
    /// Equal distances keep insertion order.
    pub async fn search(&self, query_text: &str, k: usize) -> AppResult<Vec<ScoredChunk>> {
        if k == 0 || self.is_empty().await {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(query_text).await?;

        let state = self.state.read().await;
        let Some(dim) = state.dimension else {
            return Ok(Vec::new());
        };
        if query.len() != dim {
            return Err(AppError::Knowledge(format!(
                "Query embedding has dimension {}, index uses {}",
                query.len(),
                dim
            )));
        }

        let mut scored: Vec<(usize, f32)> = (0..state.chunks.len())
            .map(|i| (i, squared_l2(&query, state.row(i, dim))))
            .collect();
        // stable sort keeps insertion order among ties
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, distance)| ScoredChunk {
                chunk: state.chunks[i].clone(),
                distance,
            })
            .collect())
    }

    /// Persist the index. Returns `Ok(false)` when there is nothing to save.
    ///
    /// An index emptied by removals has its files deleted, so a reload sees
    /// the same empty state.
    pub async fn save(&self) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if state.chunks.is_empty() {
            if state.synced || state.dimension.is_none() {
                tracing::debug!("Vector index empty, nothing to save");
                return Ok(false);
            }
            self.remove_files()?;
            *state = IndexState {
                synced: true,
                ..IndexState::default()
            };
            tracing::info!("Vector index emptied, removed files in {:?}", self.dir);
            return Ok(true);
        }
        let Some(dim) = state.dimension else {
            return Ok(false);
        };

        fs::create_dir_all(&self.dir)?;

        let bytes = encode_vectors(dim, state.chunks.len(), &state.vectors);
        let metadata = IndexMetadata {
            version: FORMAT_VERSION,
            dimension: dim,
            embedding_model: self.embedder.model_name().to_string(),
            checksum: hex_digest(&bytes),
            updated_at: chrono::Utc::now(),
            chunks: state.chunks.clone(),
        };
        let json = serde_json::to_vec_pretty(&metadata)?;

        self.write_atomic(VECTORS_FILE, &bytes)?;
        self.write_atomic(METADATA_FILE, &json)?;
        state.synced = true;

        tracing::info!(
            vectors = state.chunks.len(),
            "Saved vector index to {:?}",
            self.dir
        );
        Ok(true)
    }

    /// Clear the in-memory index and delete its files.
    pub async fn reset(&self) -> AppResult<()> {
        let mut state = self.state.write().await;
        self.remove_files()?;
        *state = IndexState::default();
        tracing::info!("Reset vector index at {:?}", self.dir);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.chunks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.chunks.is_empty()
    }

    /// Distinct source filenames, sorted.
    pub async fn sources(&self) -> Vec<String> {
        let state = self.state.read().await;
        state
            .chunks
            .iter()
            .map(|c| c.source_filename.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn remove_files(&self) -> AppResult<()> {
        for name in [VECTORS_FILE, METADATA_FILE] {
            let path = self.dir.join(name);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn write_atomic(&self, name: &str, bytes: &[u8]) -> AppResult<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.dir.join(name))
            .map_err(|e| AppError::Io(e.error))?;
        Ok(())
    }
}

/// Keep only chunks not from `source`. Returns how many were dropped.
fn retain_except(state: &mut IndexState, source: &str) -> usize {
    let Some(dim) = state.dimension else {
        return 0;
    };

    let before = state.chunks.len();
    let mut vectors = Vec::with_capacity(state.vectors.len());
    let mut chunks = Vec::with_capacity(before);
    for (i, chunk) in state.chunks.iter().enumerate() {
        if chunk.source_filename != source {
            vectors.extend_from_slice(state.row(i, dim));
            chunks.push(chunk.clone());
        }
    }

    let removed = before - chunks.len();
    if removed > 0 {
        state.vectors = vectors;
        state.chunks = chunks;
        state.synced = false;
    }
    removed
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn hex_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn encode_vectors(dim: usize, count: usize, vectors: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + vectors.len() * 4);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(dim as u32).to_le_bytes());
    bytes.extend_from_slice(&(count as u64).to_le_bytes());
    for value in vectors {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn decode_vectors(bytes: &[u8]) -> AppResult<(usize, Vec<f32>)> {
    if bytes.len() < HEADER_LEN || &bytes[0..4] != MAGIC {
        return Err(AppError::CorruptIndex(
            "Vector file has no valid header".to_string(),
        ));
    }

    let read_u32 = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
    let version = read_u32(4);
    if version != FORMAT_VERSION {
        return Err(AppError::CorruptIndex(format!(
            "Unsupported vector file version {}",
            version
        )));
    }

    let dim = read_u32(8) as usize;
    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(&bytes[12..20]);
    let count = u64::from_le_bytes(count_bytes) as usize;

    let expected = dim
        .checked_mul(count)
        .and_then(|n| n.checked_mul(4))
        .and_then(|n| n.checked_add(HEADER_LEN));
    if expected != Some(bytes.len()) {
        return Err(AppError::CorruptIndex(format!(
            "Vector file is {} bytes, header declares {} vectors of dimension {}",
            bytes.len(),
            count,
            dim
        )));
    }

    let vectors = bytes[HEADER_LEN..]
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok((dim, vectors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockProvider;
    use tempfile::TempDir;

    fn chunk(source: &str, index: usize, text: &str) -> Chunk {
        Chunk {
            source_filename: source.to_string(),
            chunk_index: index,
            start_offset: index * 100,
            text: text.to_string(),
        }
    }

    fn index_in(dir: &Path) -> VectorIndex {
        VectorIndex::new(dir, Arc::new(MockProvider::new(64)))
    }

    async fn populated(dir: &Path) -> VectorIndex {
        let index = index_in(dir);
        index
            .add(vec![
                chunk("qc.md", 0, "Quantum computing uses qubits."),
                chunk("qc.md", 1, "Decoherence limits qubit lifetime."),
                chunk("bread.md", 0, "Sourdough needs a starter culture."),
            ])
            .await
            .unwrap();
        index
    }

    #[tokio::test]
    async fn test_empty_index() {
        let temp = TempDir::new().unwrap();
        let index = index_in(temp.path());

        assert!(!index.load().await.unwrap());
        assert!(index.search("anything", 5).await.unwrap().is_empty());
        assert!(!index.save().await.unwrap());
        assert!(!temp.path().join(VECTORS_FILE).exists());
    }

    #[tokio::test]
    async fn test_search_orders_by_distance() {
        let temp = TempDir::new().unwrap();
        let index = populated(temp.path()).await;

        let results = index.search("quantum computing qubits", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.text, "Quantum computing uses qubits.");
        assert!(results[0].distance <= results[1].distance);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let temp = TempDir::new().unwrap();
        let index = index_in(temp.path());
        index
            .add(vec![chunk("a.md", 0, "same text"), chunk("b.md", 0, "same text")])
            .await
            .unwrap();

        let results = index.search("same text", 2).await.unwrap();
        assert_eq!(results[0].chunk.source_filename, "a.md");
        assert_eq!(results[1].chunk.source_filename, "b.md");
        assert_eq!(results[0].distance, results[1].distance);
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let index = populated(temp.path()).await;
        assert!(index.save().await.unwrap());

        let reloaded = index_in(temp.path());
        assert!(reloaded.load().await.unwrap());
        assert_eq!(reloaded.len().await, 3);
        assert_eq!(reloaded.sources().await, vec!["bread.md", "qc.md"]);

        let before = index.search("decoherence", 3).await.unwrap();
        let after = reloaded.search("decoherence", 3).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_load_twice_is_idempotent() {
        let temp = TempDir::new().unwrap();
        populated(temp.path()).await.save().await.unwrap();

        let index = index_in(temp.path());
        assert!(index.load().await.unwrap());
        let once = index.search("qubits", 3).await.unwrap();
        assert!(index.load().await.unwrap());
        let twice = index.search("qubits", 3).await.unwrap();

        assert_eq!(index.len().await, 3);
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_single_file_counts_as_missing() {
        let temp = TempDir::new().unwrap();
        populated(temp.path()).await.save().await.unwrap();
        fs::remove_file(temp.path().join(METADATA_FILE)).unwrap();

        assert!(!index_in(temp.path()).load().await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_vectors_detected() {
        let temp = TempDir::new().unwrap();
        populated(temp.path()).await.save().await.unwrap();

        let path = temp.path().join(VECTORS_FILE);
        let mut bytes = fs::read(&path).unwrap();
        bytes.truncate(bytes.len() - 4);
        fs::write(&path, bytes).unwrap();

        let err = index_in(temp.path()).load().await.unwrap_err();
        assert!(matches!(err, AppError::CorruptIndex(_)));
    }

    #[tokio::test]
    async fn test_corrupt_metadata_detected() {
        let temp = TempDir::new().unwrap();
        populated(temp.path()).await.save().await.unwrap();
        fs::write(temp.path().join(METADATA_FILE), "{not json").unwrap();

        let err = index_in(temp.path()).load().await.unwrap_err();
        assert!(matches!(err, AppError::CorruptIndex(_)));
    }

    #[tokio::test]
    async fn test_dimension_change_is_rejected() {
        let temp = TempDir::new().unwrap();
        populated(temp.path()).await.save().await.unwrap();

        let other = VectorIndex::new(temp.path(), Arc::new(MockProvider::new(32)));
        assert!(matches!(
            other.load().await.unwrap_err(),
            AppError::Knowledge(_)
        ));
    }

    #[tokio::test]
    async fn test_remove_source_and_reset() {
        let temp = TempDir::new().unwrap();
        let index = populated(temp.path()).await;

        assert_eq!(index.remove_source("qc.md").await, 2);
        assert_eq!(index.sources().await, vec!["bread.md"]);
        let results = index.search("qubits", 5).await.unwrap();
        assert_eq!(results.len(), 1);

        index.save().await.unwrap();
        index.reset().await.unwrap();
        assert!(index.is_empty().await);
        assert!(!temp.path().join(VECTORS_FILE).exists());
        assert!(!temp.path().join(METADATA_FILE).exists());
    }

    #[tokio::test]
    async fn test_save_after_removing_everything() {
        let temp = TempDir::new().unwrap();
        let index = index_in(temp.path());
        index.add(vec![chunk("a.md", 0, "Only chunk.")]).await.unwrap();
        assert!(index.save().await.unwrap());

        assert_eq!(index.remove_source("a.md").await, 1);
        assert!(index.save().await.unwrap());
        assert!(!temp.path().join(VECTORS_FILE).exists());
        assert!(!temp.path().join(METADATA_FILE).exists());

        let reloaded = index_in(temp.path());
        assert!(!reloaded.load().await.unwrap());
        assert!(reloaded.is_empty().await);
        assert!(!index.save().await.unwrap());
    }

    #[tokio::test]
    async fn test_replace_source() {
        let temp = TempDir::new().unwrap();
        let index = populated(temp.path()).await;

        let removed = index
            .replace_source("qc.md", vec![chunk("qc.md", 0, "Qubits, revised.")])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(index.len().await, 2);

        let results = index.search("qubits revised", 1).await.unwrap();
        assert_eq!(results[0].chunk.text, "Qubits, revised.");
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut bytes = encode_vectors(2, 1, &[1.0, 2.0]);
        bytes[0] = b'X';
        assert!(matches!(
            decode_vectors(&bytes),
            Err(AppError::CorruptIndex(_))
        ));
    }
}
