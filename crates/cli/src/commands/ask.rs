//! Ask command handler.
//!
//! Answers a question from the indexed documents, optionally enriched with
//! web search results.

use anyhow::Context;
use clap::Args;
use notebook_core::config::AppConfig;
use notebook_knowledge::{ChatAnswer, Notebook};

/// Ask a question about the indexed documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Answer from the documents only
    #[arg(long)]
    pub no_web: bool,

    /// Print the model's reasoning before the answer
    #[arg(long)]
    pub show_reasoning: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        if self.question.trim().is_empty() {
            anyhow::bail!("No question provided");
        }

        let notebook = Notebook::initialize(config)
            .await
            .context("Failed to initialize notebook")?;

        let answer = notebook.ask(&self.question, !self.no_web).await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        } else {
            print!("{}", render(&answer, self.show_reasoning));
        }

        Ok(())
    }
}

/// Human-readable rendering: optional reasoning, the answer, then sources.
fn render(answer: &ChatAnswer, show_reasoning: bool) -> String {
    let mut out = String::new();

    if show_reasoning {
        if let Some(reasoning) = &answer.reasoning {
            out.push_str("Reasoning:\n");
            out.push_str(reasoning);
            out.push_str("\n\n");
        }
    }

    out.push_str("Answer:\n");
    out.push_str(&answer.answer);
    out.push_str("\n\n");

    if answer.context_docs_map.is_empty() {
        out.push_str("Sources: (no document context)\n");
    } else {
        out.push_str("Sources:\n");
        for entry in answer.context_docs_map.values() {
            out.push_str(&format!(
                "[{}] {} (chunk {})\n",
                entry.citation_index, entry.source, entry.chunk_index
            ));
        }
    }

    if answer.web_results.is_some() {
        out.push_str("Web search results were used.\n");
    }

    out
}
