//! Analyze command handler.

use anyhow::Context;
use clap::Args;
use notebook_core::config::AppConfig;
use notebook_knowledge::{AnalysisKind, Notebook};

/// Generate an FAQ, key topics or a mind map for one document
#[derive(Args, Debug)]
pub struct AnalyzeCommand {
    /// Document filename (as found in the document or upload folder)
    pub filename: String,

    /// Analysis type (faq, topics, mindmap)
    #[arg(short, long, default_value = "faq")]
    pub kind: AnalysisKind,

    /// Print the model's reasoning before the analysis
    #[arg(long)]
    pub show_reasoning: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing analyze command for '{}'", self.filename);

        let notebook = Notebook::initialize(config)
            .await
            .context("Failed to initialize notebook")?;

        let result = notebook.analyze(&self.filename, self.kind).await;

        if self.json {
            let output = serde_json::json!({
                "filename": self.filename,
                "kind": self.kind,
                "content": result.answer,
                "reasoning": result.reasoning,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            if self.show_reasoning {
                if let Some(reasoning) = &result.reasoning {
                    println!("Reasoning:\n{}\n", reasoning);
                }
            }
            println!("{}", result.answer);
        }

        Ok(())
    }
}
