//! Web search transports.

use async_trait::async_trait;
use notebook_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DUCKDUCKGO_URL: &str = "https://api.duckduckgo.com";

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebResult {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_href")]
    pub href: String,
    #[serde(default = "default_body")]
    pub body: String,
}

fn default_title() -> String {
    "No Title".to_string()
}

fn default_href() -> String {
    "#".to_string()
}

fn default_body() -> String {
    "No snippet available.".to_string()
}

/// A live search backend. Every failure is reported as `AppError::Transport`.
#[async_trait]
pub trait WebSearchTransport: Send + Sync + std::fmt::Debug {
    async fn text(
        &self,
        query: &str,
        max_results: usize,
        region: &str,
        timeout: Duration,
    ) -> AppResult<Vec<WebResult>>;
}

/// DuckDuckGo instant-answer API.
///
/// Uses the abstract (when present) and the related topics of the answer as
/// results. No API key required.
#[derive(Debug, Clone)]
pub struct DuckDuckGoTransport {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

/// Either a single topic or a named group of topics.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Topic {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL")]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
}

impl DuckDuckGoTransport {
    pub fn new() -> Self {
        Self::with_base_url(DUCKDUCKGO_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn collect(answer: InstantAnswer, max_results: usize) -> Vec<WebResult> {
        let mut results = Vec::new();

        if !answer.abstract_text.trim().is_empty() {
            results.push(WebResult {
                title: if answer.heading.is_empty() {
                    default_title()
                } else {
                    answer.heading.clone()
                },
                href: if answer.abstract_url.is_empty() {
                    default_href()
                } else {
                    answer.abstract_url.clone()
                },
                body: answer.abstract_text.clone(),
            });
        }

        let mut stack: Vec<RelatedTopic> = answer.related_topics.into_iter().rev().collect();
        while let Some(topic) = stack.pop() {
            match topic {
                RelatedTopic::Topic { text, first_url } if !text.trim().is_empty() => {
                    let title = text
                        .split(" - ")
                        .next()
                        .unwrap_or(text.as_str())
                        .trim()
                        .to_string();
                    results.push(WebResult {
                        title,
                        href: first_url,
                        body: text,
                    });
                }
                RelatedTopic::Topic { .. } => {}
                RelatedTopic::Group { topics } => stack.extend(topics.into_iter().rev()),
            }
        }

        results.truncate(max_results);
        results
    }
}

impl Default for DuckDuckGoTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebSearchTransport for DuckDuckGoTransport {
    #[tracing::instrument(skip(self), fields(provider = "duckduckgo"))]
    async fn text(
        &self,
        query: &str,
        max_results: usize,
        region: &str,
        timeout: Duration,
    ) -> AppResult<Vec<WebResult>> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
                ("kl", region),
            ])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("DuckDuckGo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Transport(format!(
                "DuckDuckGo returned {}",
                response.status()
            )));
        }

        let answer: InstantAnswer = response.json().await.map_err(|e| {
            AppError::Transport(format!("Failed to parse DuckDuckGo response: {}", e))
        })?;

        Ok(Self::collect(answer, max_results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn answer_json() -> serde_json::Value {
        serde_json::json!({
            "Heading": "Qubit",
            "AbstractText": "A qubit is the basic unit of quantum information.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Qubit",
            "RelatedTopics": [
                {"Text": "Quantum computing - Computation using quantum phenomena", "FirstURL": "https://duckduckgo.com/Quantum_computing"},
                {"Name": "See also", "Topics": [
                    {"Text": "Bloch sphere - Geometric representation", "FirstURL": "https://duckduckgo.com/Bloch_sphere"}
                ]},
                {"Text": "Superposition", "FirstURL": "https://duckduckgo.com/Superposition"}
            ]
        })
    }

    #[tokio::test]
    async fn test_parses_instant_answer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "qubit"))
            .and(query_param("format", "json"))
            .and(query_param("kl", "wt-wt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer_json()))
            .mount(&server)
            .await;

        let transport = DuckDuckGoTransport::with_base_url(server.uri());
        let results = transport
            .text("qubit", 3, "wt-wt", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Qubit");
        assert_eq!(results[0].href, "https://en.wikipedia.org/wiki/Qubit");
        assert_eq!(results[1].title, "Quantum computing");
        assert_eq!(results[2].title, "Bloch sphere");
    }

    #[tokio::test]
    async fn test_http_error_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = DuckDuckGoTransport::with_base_url(server.uri());
        let err = transport
            .text("qubit", 3, "wt-wt", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let result: WebResult = serde_json::from_str("{}").unwrap();
        assert_eq!(result.title, "No Title");
        assert_eq!(result.href, "#");
        assert_eq!(result.body, "No snippet available.");
    }
}
