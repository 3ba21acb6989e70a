//! Language model integration for Notebook.
//!
//! Provides a provider-agnostic, single-turn completion interface. The
//! knowledge crate only ever sends one prompt and reads one answer back;
//! everything else (retries, streaming, chat state) is out of scope here.
//!
//! # Example
//! ```no_run
//! use notebook_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "deepseek-r1:1.5b");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::OllamaClient;
