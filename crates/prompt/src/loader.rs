//! Prompt set assembly: built-in defaults plus workspace overrides.

use crate::builder::PromptTemplate;
use crate::defaults;
use crate::types::{PromptKind, PromptOverride};
use notebook_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::Path;

/// One validated template per [`PromptKind`].
#[derive(Debug, Clone)]
pub struct PromptSet {
    templates: HashMap<PromptKind, PromptTemplate>,
}

impl PromptSet {
    /// The built-in templates.
    pub fn defaults() -> AppResult<Self> {
        let mut templates = HashMap::new();
        for kind in PromptKind::ALL {
            templates.insert(kind, PromptTemplate::new(kind, defaults::template_for(kind))?);
        }
        Ok(Self { templates })
    }

    /// Built-in templates with any overrides found under `prompts_dir` applied.
    ///
    /// A missing directory is not an error. An override that fails validation is.
    ///
    /// # Example
    /// ```no_run
    /// use notebook_prompt::{PromptKind, PromptSet};
    /// use std::path::Path;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let prompts = PromptSet::load(Path::new(".notebook/prompts"))?;
    /// let text = prompts
    ///     .get(PromptKind::SubQuery)
    ///     .render(&[("query", "What is RAG?"), ("num_queries", "3")])?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(prompts_dir: &Path) -> AppResult<Self> {
        let mut set = Self::defaults()?;
        for template in load_overrides(prompts_dir)? {
            tracing::info!(kind = %template.kind(), "Using prompt override");
            set.replace(template);
        }
        Ok(set)
    }

    pub fn get(&self, kind: PromptKind) -> &PromptTemplate {
        // populated for every kind by construction
        &self.templates[&kind]
    }

    pub fn replace(&mut self, template: PromptTemplate) {
        self.templates.insert(template.kind(), template);
    }
}

/// Load and validate every `*.yml` / `*.yaml` override under `prompts_dir`.
///
/// Two files overriding the same kind are rejected.
pub fn load_overrides(prompts_dir: &Path) -> AppResult<Vec<PromptTemplate>> {
    if !prompts_dir.exists() {
        return Ok(Vec::new());
    }

    let mut seen: HashMap<PromptKind, std::path::PathBuf> = HashMap::new();
    let mut templates = Vec::new();

    for entry in walkdir::WalkDir::new(prompts_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yml") | Some("yaml")
        );
        if !path.is_file() || !is_yaml {
            continue;
        }

        tracing::debug!("Loading prompt override from: {:?}", path);

        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e))
        })?;

        let definition: PromptOverride = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Prompt(format!("Failed to parse prompt YAML {:?}: {}", path, e))
        })?;

        if let Some(previous) = seen.insert(definition.kind, path.to_path_buf()) {
            return Err(AppError::Prompt(format!(
                "Prompt '{}' overridden twice: {:?} and {:?}",
                definition.kind, previous, path
            )));
        }

        let template = PromptTemplate::new(definition.kind, definition.template)
            .map_err(|e| AppError::Prompt(format!("{:?}: {}", path, e)))?;
        templates.push(template);
    }

    Ok(templates)
}
