//! Document folders and the cleaned-text cache used for analysis.

use crate::parser::{self, ContentType};
use notebook_core::AppResult;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The default and upload document folders plus a text cache keyed by filename.
#[derive(Debug)]
pub struct DocumentLibrary {
    docs_dir: PathBuf,
    upload_dir: PathBuf,
    texts: HashMap<String, String>,
}

impl DocumentLibrary {
    pub fn new(docs_dir: impl Into<PathBuf>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            docs_dir: docs_dir.into(),
            upload_dir: upload_dir.into(),
            texts: HashMap::new(),
        }
    }

    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Rebuild the cache from both folders. Returns the number of documents cached.
    ///
    /// The default folder is read first, so on duplicate filenames its copy wins.
    /// Unreadable files are logged and skipped.
    pub fn refresh(&mut self) -> usize {
        self.texts.clear();
        for dir in [self.docs_dir.clone(), self.upload_dir.clone()] {
            let count = self.load_folder(&dir);
            tracing::info!("Cached text for {} documents from {:?}", count, dir);
        }
        self.texts.len()
    }

    fn load_folder(&mut self, dir: &Path) -> usize {
        let mut count = 0;
        for path in document_paths(dir) {
            let Some(name) = file_name(&path) else {
                continue;
            };
            if self.texts.contains_key(&name) {
                continue;
            }
            match parser::parse_file(&path) {
                Ok(text) if !text.is_empty() => {
                    self.texts.insert(name, text);
                    count += 1;
                }
                Ok(_) => tracing::warn!("Document {:?} is empty, not cached", path),
                Err(e) => tracing::warn!("Could not read {:?}: {}", path, e),
            }
        }
        count
    }

    /// Every supported document in both folders, default folder first.
    pub fn document_paths(&self) -> Vec<PathBuf> {
        let mut paths = document_paths(&self.docs_dir);
        paths.extend(document_paths(&self.upload_dir));
        paths
    }

    /// Locate `filename`, upload folder first.
    pub fn locate(&self, filename: &str) -> Option<PathBuf> {
        [&self.upload_dir, &self.docs_dir]
            .into_iter()
            .map(|dir| dir.join(filename))
            .find(|p| p.is_file())
    }

    /// Cleaned text of `filename`, from the cache or read from disk.
    ///
    /// Returns `Ok(None)` if the file is in neither folder.
    pub fn text_for(&mut self, filename: &str) -> AppResult<Option<String>> {
        if let Some(text) = self.texts.get(filename) {
            return Ok(Some(text.clone()));
        }

        let Some(path) = self.locate(filename) else {
            return Ok(None);
        };
        let text = parser::parse_file(&path)?;
        if !text.is_empty() {
            self.texts.insert(filename.to_string(), text.clone());
        }
        Ok(Some(text))
    }

    /// Cache text that arrived through ingestion.
    pub fn remember(&mut self, filename: &str, text: &str) {
        self.texts.insert(filename.to_string(), text.to_string());
    }

    /// Drop `filename` from the cache. Returns whether it was cached.
    pub fn forget(&mut self, filename: &str) -> bool {
        self.texts.remove(filename).is_some()
    }

    pub fn cached(&self) -> usize {
        self.texts.len()
    }

    /// Cached filenames, sorted.
    pub fn filenames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.texts.keys().cloned().collect();
        names.sort();
        names
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
}

/// Supported documents directly under `dir` or in its subfolders, sorted by name.
/// Editor lock files (`~...`) are skipped.
pub fn document_paths(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        tracing::debug!("Document folder {:?} not found, skipping", dir);
        return Vec::new();
    }

    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| ContentType::from_path(p).is_supported())
        .filter(|p| {
            file_name(p)
                .map(|n| !n.starts_with('~') && !n.starts_with('.'))
                .unwrap_or(false)
        })
        .collect()
}
