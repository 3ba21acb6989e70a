//! Prompt templates for Notebook.
//!
//! Every prompt the pipeline sends is a [`PromptTemplate`] of a known
//! [`PromptKind`]. Templates are Handlebars strings validated when they are
//! built: each kind declares the substitution keys it needs, and a template
//! that misses one (or references a key nobody supplies) is rejected up front
//! instead of failing on the first request.
//!
//! Built-in texts live in [`defaults`]; a workspace can replace any of them
//! with YAML files under `.notebook/prompts/`.

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::PromptTemplate;
pub use loader::{load_overrides, PromptSet};
pub use types::{PromptKind, PromptOverride};
