//! Remove command handler.

use anyhow::Context;
use clap::Args;
use notebook_core::config::AppConfig;
use notebook_knowledge::Notebook;

/// Remove a document's chunks from the index
#[derive(Args, Debug)]
pub struct RemoveCommand {
    /// File name the document was ingested under (e.g. notes.md)
    pub filename: String,
}

impl RemoveCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing remove command");

        let notebook = Notebook::initialize(config)
            .await
            .context("Failed to initialize notebook")?;
        let removed = notebook
            .remove_document(&self.filename)
            .await
            .with_context(|| format!("Failed to remove '{}'", self.filename))?;

        if removed == 0 {
            println!("'{}' is not in the index", self.filename);
        } else {
            println!("Removed {} chunks of '{}'", removed, self.filename);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(workspace: &TempDir) -> AppConfig {
        AppConfig {
            workspace: workspace.path().to_path_buf(),
            provider: "mock".to_string(),
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn test_remove_ingested_document() {
        let workspace = TempDir::new().unwrap();
        let config = config(&workspace);
        let notebook = Notebook::initialize(&config).await.unwrap();
        notebook.ingest("qc.md", "Quantum computing uses qubits.").await.unwrap();
        drop(notebook);

        let command = RemoveCommand {
            filename: "qc.md".to_string(),
        };
        command.execute(&config).await.unwrap();
        command.execute(&config).await.unwrap();

        let reopened = Notebook::initialize(&config).await.unwrap();
        assert!(reopened.index().is_empty().await);
    }
}
