//! Overlapping text chunking on semantic boundaries.
//!
//! Splitting is delegated to `text-splitter`, which prefers the coarsest
//! boundary that fits (paragraph breaks, line breaks, sentences, words) and
//! falls back to graphemes. Lengths are measured in characters. Every chunk is
//! an exact, whitespace-trimmed substring of the input, and consecutive chunks
//! either overlap by at most `chunk_overlap` characters or are separated only
//! by whitespace.

use crate::types::Chunk;
use notebook_core::{AppError, AppResult};
use std::sync::Arc;
use text_splitter::{Characters, ChunkConfig as SplitterConfig, TextSplitter};

/// Chunking parameters, lengths in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 150,
        }
    }
}

impl ChunkConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }
}

/// Splits raw document text into overlapping [`Chunk`]s.
#[derive(Clone)]
pub struct ChunkingEngine {
    config: ChunkConfig,
    splitter: Arc<TextSplitter<Characters>>,
}

impl ChunkingEngine {
    pub fn new(config: ChunkConfig) -> AppResult<Self> {
        if config.chunk_size == 0 {
            return Err(AppError::Knowledge(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(AppError::Knowledge(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }

        let splitter_config = SplitterConfig::new(config.chunk_size)
            .with_overlap(config.chunk_overlap)
            .map_err(|e| AppError::Knowledge(format!("Invalid chunking settings: {}", e)))?;

        Ok(Self {
            config,
            splitter: Arc::new(TextSplitter::new(splitter_config)),
        })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Split `text` into chunks attributed to `filename`.
    ///
    /// Empty or whitespace-only input yields no chunks.
    pub fn chunk(&self, text: &str, filename: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        // chunk starts never move backwards, so char offsets can be counted incrementally
        let mut byte_cursor = 0;
        let mut char_cursor = 0;

        for (byte_offset, piece) in self.splitter.chunk_indices(text) {
            let trimmed = piece.trim();
            if trimmed.is_empty() {
                continue;
            }
            let start = byte_offset + (piece.len() - piece.trim_start().len());

            char_cursor += text[byte_cursor..start].chars().count();
            byte_cursor = start;

            chunks.push(Chunk {
                source_filename: filename.to_string(),
                chunk_index: chunks.len(),
                start_offset: char_cursor,
                text: trimmed.to_string(),
            });
        }

        tracing::debug!(
            filename,
            chunks = chunks.len(),
            chunk_size = self.config.chunk_size,
            overlap = self.config.chunk_overlap,
            "Chunked document"
        );

        chunks
    }
}

impl std::fmt::Debug for ChunkingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkingEngine")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(size: usize, overlap: usize) -> ChunkingEngine {
        ChunkingEngine::new(ChunkConfig::new(size, overlap)).unwrap()
    }

    fn normalize(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Stitch chunks back together using their offsets, skipping overlaps.
    fn rebuild(text: &str, chunks: &[Chunk]) -> String {
        let source: Vec<char> = text.chars().collect();
        let mut rebuilt = String::new();
        let mut covered = 0;

        for chunk in chunks {
            let start = chunk.start_offset;
            let end = start + chunk.text.chars().count();
            if start > covered {
                let gap: String = source[covered..start].iter().collect();
                assert!(gap.trim().is_empty(), "non-whitespace gap: {gap:?}");
                rebuilt.push(' ');
            }
            if end > covered {
                rebuilt.extend(&source[start.max(covered)..end]);
                covered = end;
            }
        }
        rebuilt
    }

    fn sample_document() -> String {
        let mut doc = String::new();
        for p in 0..12 {
            for s in 0..6 {
                doc.push_str(&format!(
                    "Paragraph {p} sentence {s} talks about qubits, gates and decoherence. "
                ));
            }
            doc.push_str("\n\n");
        }
        doc
    }

    #[test]
    fn test_empty_and_blank_input() {
        let engine = engine(1000, 150);
        assert!(engine.chunk("", "a.txt").is_empty());
        assert!(engine.chunk("  \n\n\t ", "a.txt").is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let engine = engine(1000, 150);
        let chunks = engine.chunk("Quantum computing uses qubits.", "doc.pdf");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].start_offset, 0);
        assert_eq!(chunks[0].source_filename, "doc.pdf");
        assert_eq!(chunks[0].text, "Quantum computing uses qubits.");
    }

    #[test]
    fn test_leading_whitespace_shifts_offset() {
        let chunks = engine(1000, 150).chunk("\n\n  Hello", "a.txt");
        assert_eq!(chunks[0].start_offset, 4);
        assert_eq!(chunks[0].text, "Hello");
    }

    #[test]
    fn test_chunks_respect_size_and_indices() {
        let doc = sample_document();
        let engine = engine(300, 60);
        let chunks = engine.chunk(&doc, "notes.md");

        assert!(chunks.len() > 5);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert!(chunk.text.chars().count() <= 300);
        }
    }

    #[test]
    fn test_offsets_point_at_chunk_text() {
        let doc = sample_document();
        let chunks = engine(250, 40).chunk(&doc, "notes.md");

        for chunk in &chunks {
            let at_offset: String = doc
                .chars()
                .skip(chunk.start_offset)
                .take(chunk.text.chars().count())
                .collect();
            assert_eq!(at_offset, chunk.text);
        }
    }

    #[test]
    fn test_rebuild_matches_source() {
        let doc = sample_document();
        for (size, overlap) in [(1000, 150), (300, 60), (120, 30), (64, 0)] {
            let chunks = engine(size, overlap).chunk(&doc, "notes.md");
            assert_eq!(normalize(&rebuild(&doc, &chunks)), normalize(&doc));
        }
    }

    #[test]
    fn test_overlap_is_bounded() {
        let doc = sample_document();
        let chunks = engine(300, 100).chunk(&doc, "notes.md");

        let mut saw_overlap = false;
        for pair in chunks.windows(2) {
            let prev_end = pair[0].start_offset + pair[0].text.chars().count();
            let next_start = pair[1].start_offset;
            assert!(next_start > pair[0].start_offset);
            if next_start < prev_end {
                saw_overlap = true;
                assert!(prev_end - next_start <= 100);
            }
        }
        assert!(saw_overlap);
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let para = "word ".repeat(30);
        let doc = format!("{para}\n\n{para}\n\n{para}");
        let chunks = engine(200, 0).chunk(&doc, "a.txt");

        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert_eq!(chunk.text, para.trim());
        }
    }

    #[test]
    fn test_hard_cut_without_separators() {
        let doc = "é".repeat(25);
        let chunks = engine(10, 2).chunk(&doc, "accents.txt");

        assert!(chunks.iter().all(|c| c.text.chars().count() <= 10));
        assert_eq!(chunks[0].start_offset, 0);
        assert_eq!(normalize(&rebuild(&doc, &chunks)), doc);
    }

    #[test]
    fn test_invalid_config() {
        assert!(ChunkingEngine::new(ChunkConfig::new(100, 100)).is_err());
        assert!(ChunkingEngine::new(ChunkConfig::new(0, 0)).is_err());
    }
}
