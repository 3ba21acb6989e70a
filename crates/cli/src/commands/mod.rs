//! Command handlers for the Notebook CLI.
//!
//! Each command lives in its own submodule.

pub mod analyze;
pub mod ask;
pub mod ingest;
pub mod remove;
pub mod status;
pub mod web;

// Re-export command types for convenience
pub use analyze::AnalyzeCommand;
pub use ask::AskCommand;
pub use ingest::IngestCommand;
pub use remove::RemoveCommand;
pub use status::StatusCommand;
pub use web::WebCommand;
