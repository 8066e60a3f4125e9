//! Prompt loading: workspace overrides first, built-in definitions second.

use crate::types::{PromptBehavior, PromptDefinition};
use cropwise_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Identifier of the answer prompt used by the assistant.
pub const ANSWER_PROMPT_ID: &str = "cropwise.answer";

const ANSWER_SYSTEM: &str = "You are an agriculture education assistant.\n\n\
Only provide informational explanations.\n\
Do NOT provide fertilizer advice, chemical dosage, or yield prediction.";

const ANSWER_TEMPLATE: &str = "{{#if context}}Context:\n{{context}}\n\n{{/if}}\
Question:\n{{question}}\n\n\
Provide a simple explanation suitable for farmers.";

/// Return a built-in prompt definition by ID.
pub fn builtin_prompt(prompt_id: &str) -> Option<PromptDefinition> {
    match prompt_id {
        ANSWER_PROMPT_ID => Some(PromptDefinition {
            id: ANSWER_PROMPT_ID.to_string(),
            title: "Educational crop process answer".to_string(),
            api_version: "1.0".to_string(),
            system: Some(ANSWER_SYSTEM.to_string()),
            template: ANSWER_TEMPLATE.to_string(),
            behavior: PromptBehavior {
                temperature: Some(0.3),
                max_tokens: None,
            },
        }),
        _ => None,
    }
}

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".cropwise/prompts")
}

/// Load a prompt definition by ID.
///
/// Looks for `.cropwise/prompts/<id>.yml` in the workspace and falls back to
/// the built-in definition with the same ID.
///
/// # Example
/// ```no_run
/// use cropwise_prompt::{load_prompt, ANSWER_PROMPT_ID};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), ANSWER_PROMPT_ID)?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    if !prompt_file.exists() {
        tracing::debug!("No override at {:?}, using built-in prompt", prompt_file);
        return builtin_prompt(prompt_id)
            .ok_or_else(|| AppError::Prompt(format!("Prompt not found: {}", prompt_id)));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// List prompt override IDs present in the workspace.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let dir = prompts_dir(workspace_path);

    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut prompt_ids = Vec::new();

    for entry in walkdir::WalkDir::new(&dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                prompt_ids.push(stem.to_string());
            }
        }
    }

    prompt_ids.sort();
    Ok(prompt_ids)
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
