//! Web command handler.

use clap::Args;
use notebook_core::config::AppConfig;
use notebook_knowledge::web::{DuckDuckGoTransport, WebSearchClient};
use std::sync::Arc;

/// Run a raw web search
#[derive(Args, Debug)]
pub struct WebCommand {
    /// Search query
    pub query: String,
}

impl WebCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing web command");

        let client = WebSearchClient::new(
            config.web_search.clone(),
            Arc::new(DuckDuckGoTransport::new()),
        );
        if !client.is_enabled() {
            anyhow::bail!("Web search is disabled (NOTEBOOK_WEB_SEARCH_ENABLED)");
        }

        match client.search(&self.query).await {
            Some(text) => println!("{}", text),
            None => println!("No web results for '{}'", self.query),
        }

        Ok(())
    }
}
