//! Prompt loader for YAML prompt definitions.
//!
//! The two answer prompts are compiled into the binary. A prompts directory
//! may override either of them, or add new ones, with `<id>.yml` files.

use crate::types::PromptDefinition;
use rag_core::{AppError, AppResult};
use std::path::Path;

/// Prompt used when a retrieved fact grounds the answer.
pub const KNOWLEDGE_BASE_PROMPT_ID: &str = "answer.knowledge_base";

/// Prompt used when the answer comes from the model's general knowledge.
pub const TRAINING_DATA_PROMPT_ID: &str = "answer.training_data";

const BUILTIN_PROMPTS: [(&str, &str); 2] = [
    (
        KNOWLEDGE_BASE_PROMPT_ID,
        include_str!("../prompts/answer.knowledge_base.yml"),
    ),
    (
        TRAINING_DATA_PROMPT_ID,
        include_str!("../prompts/answer.training_data.yml"),
    ),
];

/// Load a prompt definition by ID.
///
/// Looks for `<prompts_dir>/<id>.yml` first, then falls back to the
/// built-in definition with that ID.
///
/// # Example
/// ```no_run
/// use rag_prompt::{load_prompt, KNOWLEDGE_BASE_PROMPT_ID};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(None, KNOWLEDGE_BASE_PROMPT_ID)?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(prompts_dir: Option<&Path>, prompt_id: &str) -> AppResult<PromptDefinition> {
    if let Some(dir) = prompts_dir {
        let prompt_file = dir.join(format!("{}.yml", prompt_id));

        if prompt_file.exists() {
            tracing::debug!("Loading prompt from: {:?}", prompt_file);

            let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
                AppError::Prompt(format!(
                    "Failed to read prompt file {:?}: {}",
                    prompt_file, e
                ))
            })?;

            let definition = parse_prompt(&contents, &prompt_file.display().to_string())?;
            tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);
            return Ok(definition);
        }
    }

    let contents = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .map(|(_, contents)| *contents)
        .ok_or_else(|| AppError::Prompt(format!("Prompt not found: {}", prompt_id)))?;

    parse_prompt(contents, prompt_id)
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e))
    })?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
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
