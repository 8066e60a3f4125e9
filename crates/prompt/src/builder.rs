//! Prompt builder for rendering templates and injecting retrieved context.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
use cropwise_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition, a question and optional context.
///
/// The question is bound to `{{question}}` and the context, when present and
/// non-empty, to `{{context}}`. Templates use `{{#if context}}` to render the
/// retrieval-free variant.
///
/// # Example
/// ```
/// use cropwise_prompt::{build_prompt, builtin_prompt, ANSWER_PROMPT_ID};
///
/// let def = builtin_prompt(ANSWER_PROMPT_ID).unwrap();
/// let built = build_prompt(&def, "What is winnowing?", Some("Winnowing removes chaff.")).unwrap();
/// assert!(built.user.contains("Winnowing removes chaff."));
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    question: &str,
    context: Option<&str>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let mut variables = HashMap::new();
    variables.insert("question".to_string(), question.to_string());

    let context_included = match context {
        Some(ctx) if !ctx.trim().is_empty() => {
            variables.insert("context".to_string(), ctx.to_string());
            true
        }
        _ => false,
    };

    let user = render_template(&definition.template, &variables)?;
    let system = definition
        .system
        .as_deref()
        .map(|tpl| render_template(tpl, &variables))
        .transpose()?;

    tracing::debug!(
        "Built prompt '{}' ({} bytes, context: {})",
        definition.id,
        user.len(),
        context_included
    );

    Ok(BuiltPrompt {
        system,
        user,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            context_included,
            resolved_variables: variables,
        },
    })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text output, no HTML escaping
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{builtin_prompt, ANSWER_PROMPT_ID};
    use crate::types::PromptBehavior;

    fn create_test_definition() -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            system: Some("Be brief.".to_string()),
            template: "{{#if context}}Context: {{context}}\n{{/if}}Question: {{question}}"
                .to_string(),
            behavior: PromptBehavior::default(),
        }
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "What is sowing?".to_string());

        let result = render_template("Question: {{question}}", &vars).unwrap();
        assert_eq!(result, "Question: What is sowing?");
    }

    #[test]
    fn test_no_html_escaping() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "rice & wheat <crops>".to_string());

        let result = render_template("{{question}}", &vars).unwrap();
        assert_eq!(result, "rice & wheat <crops>");
    }

    #[test]
    fn test_build_prompt_without_context() {
        let def = create_test_definition();
        let built = build_prompt(&def, "What is sowing?", None).unwrap();

        assert_eq!(built.user, "Question: What is sowing?");
        assert_eq!(built.system.as_deref(), Some("Be brief."));
        assert!(!built.metadata.context_included);
    }

    #[test]
    fn test_blank_context_treated_as_absent() {
        let def = create_test_definition();
        let built = build_prompt(&def, "What is sowing?", Some("   ")).unwrap();
        assert!(!built.metadata.context_included);
        assert!(!built.user.contains("Context:"));
    }

    #[test]
    fn test_build_prompt_with_context() {
        let def = create_test_definition();
        let built = build_prompt(&def, "What is sowing?", Some("Seeds are planted.")).unwrap();

        assert!(built.user.starts_with("Context: Seeds are planted."));
        assert!(built.metadata.context_included);
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
    }

    #[test]
    fn test_builtin_answer_prompt_is_restrictive() {
        let def = builtin_prompt(ANSWER_PROMPT_ID).unwrap();
        let built = build_prompt(&def, "What is drying?", Some("Drying lowers moisture.")).unwrap();

        let system = built.system.unwrap();
        assert!(system.contains("agriculture education assistant"));
        assert!(system.contains("Do NOT provide fertilizer advice"));
        assert!(built.user.contains("Context:\nDrying lowers moisture."));
        assert!(built.user.contains("Question:\nWhat is drying?"));
        assert!(built.user.contains("suitable for farmers"));
    }

    #[test]
    fn test_invalid_template() {
        let vars = HashMap::new();
        assert!(render_template("{{#if}}", &vars).is_err());
    }
}
