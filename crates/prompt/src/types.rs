//! Prompt types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A prompt definition, built in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Optional system message template (Handlebars)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// User message template (Handlebars)
    pub template: String,

    /// Generation settings
    #[serde(default)]
    pub behavior: PromptBehavior,
}

/// Generation settings attached to a prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptBehavior {
    /// Sampling temperature override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens in the answer
    #[serde(rename = "maxTokens", default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Whether retrieved context was injected
    #[serde(rename = "contextIncluded")]
    pub context_included: bool,

    /// Template variables that were resolved
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: cropwise.answer
title: Answer
apiVersion: "1.0"
system: "Educational only."
template: "{{question}}"
behavior:
  temperature: 0.2
  maxTokens: 400
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "cropwise.answer");
        assert_eq!(def.system.as_deref(), Some("Educational only."));
        assert_eq!(def.behavior.temperature, Some(0.2));
        assert_eq!(def.behavior.max_tokens, Some(400));
    }

    #[test]
    fn test_behavior_defaults() {
        let yaml = r#"
id: minimal
title: Minimal
apiVersion: "1.0"
template: "{{question}}"
"#;
        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert!(def.system.is_none());
        assert!(def.behavior.temperature.is_none());
    }
}
