//! Prompt builder for rendering templates and injecting conversation history.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
use coursewise_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// The system template is rendered with every variable; a non-empty
/// `history` variable marks the prompt as carrying prior conversation.
///
/// # Example
/// ```no_run
/// use coursewise_prompt::{build_prompt, defaults};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "What does lesson 2 cover?".to_string());
///
/// let built = build_prompt(&defaults::course_assistant(), vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let history_included = variables
        .get("history")
        .is_some_and(|h| !h.trim().is_empty());

    let system = render_template(&definition.system, &variables)?
        .trim_end()
        .to_string();
    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt {
        system,
        user,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            history_included,
            resolved_variables: variables,
        },
    })
}

/// Build the prompt for one course question with optional formatted history.
pub fn build_course_prompt(
    definition: &PromptDefinition,
    query: &str,
    history: Option<&str>,
) -> AppResult<BuiltPrompt> {
    let mut variables = HashMap::new();
    variables.insert("query".to_string(), query.to_string());
    if let Some(history) = history {
        variables.insert("history".to_string(), history.to_string());
    }
    build_prompt(definition, variables)
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
