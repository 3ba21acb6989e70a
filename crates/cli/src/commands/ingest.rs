//! Ingest command handler.
//!
//! Indexes plain-text and Markdown documents into the workspace notebook.

use anyhow::Context;
use clap::Args;
use notebook_core::{config::AppConfig, AppError};
use notebook_knowledge::parser::ContentType;
use notebook_knowledge::{IngestReport, Notebook};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Index documents (files or directories)
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Files or directories to ingest (default: the configured document folders)
    pub paths: Vec<PathBuf>,

    /// Clear the index before ingesting
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ingest command");
        tracing::debug!("Ingest options: {:?}", self);

        // a reset must not depend on the old index loading cleanly
        let notebook = if self.reset {
            Notebook::initialize_fresh(config).await
        } else {
            Notebook::initialize(config).await
        }
        .context("Failed to initialize notebook")?;

        let reports = if self.paths.is_empty() {
            notebook.ingest_library().await?
        } else {
            let files = collect_documents(&self.paths);
            if files.is_empty() {
                anyhow::bail!("No supported documents (.md, .markdown, .txt) found");
            }
            ingest_files(&notebook, &files).await?
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        } else {
            for report in &reports {
                println!(
                    "{}: {} chunks ({} characters)",
                    report.filename, report.chunks, report.characters
                );
            }
            let chunks: usize = reports.iter().map(|r| r.chunks).sum();
            println!("Ingested {} documents ({} chunks)", reports.len(), chunks);
        }

        Ok(())
    }
}

async fn ingest_files(notebook: &Notebook, files: &[PathBuf]) -> anyhow::Result<Vec<IngestReport>> {
    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        match notebook.ingest_path(path).await {
            Ok(report) => reports.push(report),
            Err(e @ AppError::EmbeddingUnavailable(_)) => {
                return Err(e).with_context(|| format!("Failed to ingest {:?}", path));
            }
            Err(e) => {
                tracing::warn!("Skipping {:?}: {}", path, e);
                eprintln!("Skipped {}: {}", path.display(), e);
            }
        }
    }
    Ok(reports)
}

/// Expand `paths` into supported document files. Directories are walked
/// recursively in file-name order; explicitly named files are kept as given.
fn collect_documents(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(
                WalkDir::new(path)
                    .follow_links(false)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                    .map(|e| e.into_path())
                    .filter(|p| is_document(p)),
            );
        } else {
            tracing::warn!("Path {:?} does not exist, skipping", path);
        }
    }
    files
}

fn is_document(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.') || n.starts_with('~'))
        .unwrap_or(true);
    !hidden && ContentType::from_path(path).is_supported()
}
