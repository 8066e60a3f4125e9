//! Prompt system for Cropwise.
//!
//! - Built-in educational answer prompt
//! - YAML overrides under `.cropwise/prompts/`
//! - Handlebars rendering with retrieved context injection

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{builtin_prompt, list_prompts, load_prompt, ANSWER_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition};
