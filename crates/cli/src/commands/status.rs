//! Status command handler.

use anyhow::Context;
use clap::Args;
use notebook_core::config::AppConfig;
use notebook_knowledge::Notebook;

/// Show index and service status
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing status command");

        let notebook = Notebook::initialize(config)
            .await
            .context("Failed to initialize notebook")?;
        let status = notebook.status().await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            println!("Provider: {}", status.provider);
            println!("  Embedding model: {}", status.embedding_model);
            println!("  Vectors: {}", status.vectors);
            println!("  Sources: {}", status.sources.len());
            for source in &status.sources {
                println!("    - {}", source);
            }
            println!("  Documents cached: {}", status.documents_cached);
            println!(
                "  Language model: {}",
                if status.model_available { "available" } else { "unavailable" }
            );
            println!(
                "  Web search: {}",
                if status.web_search_enabled { "enabled" } else { "disabled" }
            );
            println!("  Index: {:?}", config.index_dir());
        }

        Ok(())
    }
}
