//! Web search enrichment.
//!
//! [`WebSearchClient`] wraps a [`WebSearchTransport`] with a TTL cache and
//! formats hits into prompt-ready text. It never fails: transport errors
//! degrade to "no web context".

pub mod cache;
pub mod transport;

pub use cache::{Clock, ManualClock, SearchCache, SystemClock};
pub use transport::{DuckDuckGoTransport, WebResult, WebSearchTransport};

use crate::rag::retriever::CONTEXT_SEPARATOR;
use notebook_core::config::WebSearchSettings;
use std::sync::Arc;
use std::time::Duration;

/// Characters of a result body kept in the snippet.
pub const SNIPPET_PREVIEW_CHARS: usize = 250;

/// Cached, formatted web search.
#[derive(Debug)]
pub struct WebSearchClient {
    settings: WebSearchSettings,
    transport: Arc<dyn WebSearchTransport>,
    cache: SearchCache,
}

impl WebSearchClient {
    pub fn new(settings: WebSearchSettings, transport: Arc<dyn WebSearchTransport>) -> Self {
        Self::with_clock(settings, transport, Arc::new(SystemClock))
    }

    pub fn with_clock(
        settings: WebSearchSettings,
        transport: Arc<dyn WebSearchTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ttl = chrono::Duration::seconds(settings.cache_ttl.min(i64::MAX as u64) as i64);
        Self {
            settings,
            transport,
            cache: SearchCache::new(ttl, clock),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    /// Formatted results for `query`, or `None` when search is disabled,
    /// found nothing, or failed.
    ///
    /// Fresh cache entries (including cached "no results") are returned
    /// without touching the transport. Failures are not cached.
    pub async fn search(&self, query: &str) -> Option<String> {
        if !self.settings.enabled {
            tracing::debug!("Web search disabled, skipping");
            return None;
        }

        if let Some(cached) = self.cache.get(query).await {
            tracing::info!("Returning cached web results for '{}'", query);
            return cached;
        }

        tracing::info!("Performing web search for '{}'", query);
        let results = match self
            .transport
            .text(
                query,
                self.settings.max_results,
                &self.settings.region,
                Duration::from_secs(self.settings.timeout),
            )
            .await
        {
            Ok(results) => results,
            Err(e) => {
                tracing::error!("Web search failed for '{}': {}", query, e);
                return None;
            }
        };

        let text = (!results.is_empty()).then(|| format_results(&results));
        match &text {
            Some(t) => tracing::info!(
                results = results.len(),
                chars = t.chars().count(),
                "Web search returned results"
            ),
            None => tracing::info!("Web search returned no results"),
        }

        self.cache.insert(query, text.clone()).await;
        text
    }
}

/// Number and join results, cutting each body to a bounded preview.
pub fn format_results(results: &[WebResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "Web Search Result [{}]: {}\nSource: {}\nSnippet: {}",
                i + 1,
                r.title,
                r.href,
                preview(&r.body)
            )
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

fn preview(body: &str) -> String {
    let mut chars = body.char_indices();
    let cut = match chars.nth(SNIPPET_PREVIEW_CHARS) {
        Some((at, _)) => format!("{}...", &body[..at]),
        None => body.to_string(),
    };
    cut.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, body: &str) -> WebResult {
        WebResult {
            title: title.to_string(),
            href: format!("https://example.com/{title}"),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_format_results() {
        let text = format_results(&[result("a", "first"), result("b", " second ")]);
        assert_eq!(
            text,
            "Web Search Result [1]: a\nSource: https://example.com/a\nSnippet: first\n\n---\n\nWeb Search Result [2]: b\nSource: https://example.com/b\nSnippet: second"
        );
    }

    #[test]
    fn test_preview_truncates_long_bodies() {
        let exact = "x".repeat(SNIPPET_PREVIEW_CHARS);
        assert_eq!(preview(&exact), exact);

        let long = "é".repeat(SNIPPET_PREVIEW_CHARS + 10);
        let cut = preview(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), SNIPPET_PREVIEW_CHARS + 3);
    }
}
