//! Validated prompt templates and rendering.

use crate::types::PromptKind;
use handlebars::Handlebars;
use notebook_core::{AppError, AppResult};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

const TEMPLATE_NAME: &str = "prompt";

/// A compiled, validated Handlebars template for one [`PromptKind`].
#[derive(Clone)]
pub struct PromptTemplate {
    kind: PromptKind,
    source: String,
    registry: Handlebars<'static>,
}

impl fmt::Debug for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptTemplate")
            .field("kind", &self.kind)
            .field("len", &self.source.len())
            .finish()
    }
}

impl PromptTemplate {
    /// Compile and validate a template.
    ///
    /// Fails with `AppError::Prompt` when the text is empty, does not parse,
    /// omits one of the kind's required keys, or references a key the kind
    /// does not supply.
    pub fn new(kind: PromptKind, source: impl Into<String>) -> AppResult<Self> {
        let source = source.into();

        if source.trim().is_empty() {
            return Err(AppError::Prompt(format!("Template '{}' is empty", kind)));
        }

        let referenced = referenced_keys(&source);
        let required: BTreeSet<&str> = kind.required_keys().iter().copied().collect();

        let missing: Vec<&str> = required
            .iter()
            .filter(|key| !referenced.contains(**key))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Prompt(format!(
                "Template '{}' is missing required keys: {}",
                kind,
                missing.join(", ")
            )));
        }

        let unknown: Vec<&String> = referenced
            .iter()
            .filter(|key| !required.contains(key.as_str()))
            .collect();
        if !unknown.is_empty() {
            return Err(AppError::Prompt(format!(
                "Template '{}' references unknown keys: {}",
                kind,
                unknown
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        let mut registry = Handlebars::new();
        // Plain text, not HTML
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);
        registry
            .register_template_string(TEMPLATE_NAME, &source)
            .map_err(|e| AppError::Prompt(format!("Failed to compile '{}': {}", kind, e)))?;

        Ok(Self {
            kind,
            source,
            registry,
        })
    }

    pub fn kind(&self) -> PromptKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render with the given substitutions.
    ///
    /// Every required key of the kind must be present; extra keys are an error
    /// so that callers and templates cannot silently drift apart.
    pub fn render(&self, values: &[(&str, &str)]) -> AppResult<String> {
        let mut vars: BTreeMap<&str, &str> = BTreeMap::new();
        for (key, value) in values {
            if !self.kind.required_keys().contains(key) {
                return Err(AppError::Prompt(format!(
                    "Key '{}' is not accepted by template '{}'",
                    key, self.kind
                )));
            }
            vars.insert(*key, *value);
        }

        if let Some(missing) = self
            .kind
            .required_keys()
            .iter()
            .find(|key| !vars.contains_key(**key))
        {
            return Err(AppError::Prompt(format!(
                "Missing value for '{}' when rendering '{}'",
                missing, self.kind
            )));
        }

        let rendered = self
            .registry
            .render(TEMPLATE_NAME, &vars)
            .map_err(|e| AppError::Prompt(format!("Failed to render '{}': {}", self.kind, e)))?;

        tracing::debug!(kind = %self.kind, len = rendered.len(), "Rendered prompt");

        Ok(rendered)
    }
}

/// Collect the plain variable names a template references.
///
/// Recognises `{{name}}`, `{{{name}}}`, whitespace-control `{{~name~}}` and the
/// argument of block helpers such as `{{#if name}}`. Closing tags, `else`,
/// comments and partials reference nothing.
fn referenced_keys(source: &str) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    let mut rest = source;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };

        let inner = after_open[..close]
            .trim_start_matches('{')
            .trim_matches('~')
            .trim();
        rest = &after_open[close + 2..];

        if inner.starts_with('!') || inner.starts_with('/') || inner.starts_with('>') {
            continue;
        }

        let candidate = match inner.strip_prefix('#') {
            Some(block) => block.split_whitespace().nth(1),
            None => inner.split_whitespace().next(),
        };

        if let Some(name) = candidate {
            if name != "else" && is_identifier(name) {
                keys.insert(name.to_string());
            }
        }
    }

    keys
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_simple_template() {
        let template = PromptTemplate::new(
            PromptKind::SubQuery,
            "Give {{num_queries}} queries for \"{{query}}\"",
        )
        .unwrap();

        let rendered = template
            .render(&[("query", "What is <RAG>?"), ("num_queries", "3")])
            .unwrap();
        // no HTML escaping
        assert_eq!(rendered, "Give 3 queries for \"What is <RAG>?\"");
    }

    #[test]
    fn test_missing_required_key_rejected_at_construction() {
        let err = PromptTemplate::new(PromptKind::SubQuery, "Queries for {{query}}").unwrap_err();
        assert!(err.to_string().contains("num_queries"));
    }

    #[test]
    fn test_unknown_key_rejected_at_construction() {
        let err = PromptTemplate::new(
            PromptKind::AnalysisFaq,
            "{{document_text}} and {{workspace}}",
        )
        .unwrap_err();
        assert!(err.to_string().contains("workspace"));
    }

    #[test]
    fn test_block_helpers_count_as_references() {
        let template = PromptTemplate::new(
            PromptKind::AnalysisTopics,
            "{{#if document_text}}{{~document_text~}}{{else}}empty{{/if}}",
        )
        .unwrap();
        assert_eq!(template.render(&[("document_text", "abc")]).unwrap(), "abc");
    }

    #[test]
    fn test_render_requires_all_values() {
        let template =
            PromptTemplate::new(PromptKind::SubQuery, "{{num_queries}} {{query}}").unwrap();
        let err = template.render(&[("query", "x")]).unwrap_err();
        assert!(matches!(err, AppError::Prompt(_)));
    }

    #[test]
    fn test_render_rejects_extra_values() {
        let template = PromptTemplate::new(PromptKind::AnalysisFaq, "{{document_text}}").unwrap();
        assert!(template
            .render(&[("document_text", "x"), ("query", "y")])
            .is_err());
    }

    #[test]
    fn test_empty_template_rejected() {
        assert!(PromptTemplate::new(PromptKind::Synthesis, "   ").is_err());
    }

    #[test]
    fn test_referenced_keys_skips_comments_and_closers() {
        let keys = referenced_keys("{{! note }}{{{raw}}} {{#each items}}{{/each}} {{> part}}");
        let keys: Vec<_> = keys.into_iter().collect();
        assert_eq!(keys, vec!["items".to_string(), "raw".to_string()]);
    }
}
