//! Completion capability for Cropwise.
//!
//! A provider-agnostic `LlmClient` trait with two implementations:
//! - **OpenAI-compatible** chat completions (OpenRouter by default)
//! - **Ollama** local runtime
//!
//! # Example
//! ```no_run
//! use cropwise_llm::{create_client, LlmClient, LlmRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("ollama", None, None, 30)?;
//! let request = LlmRequest::new("What is crop rotation?", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiCompatibleClient};
pub use types::ProviderType;
