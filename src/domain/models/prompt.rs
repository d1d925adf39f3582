use std::fmt;
use std::sync::Arc;

use handlebars::Handlebars;
use serde_json::json;

use super::{Message, RetrievedContext, Role};
use crate::domain::DomainError;

/// Everything a prompt specification may draw on for a single turn.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub input: &'a str,
    pub context: Option<&'a RetrievedContext>,
    pub history: &'a [Message],
}

impl<'a> PromptInput<'a> {
    pub fn new(
        input: &'a str,
        context: Option<&'a RetrievedContext>,
        history: &'a [Message],
    ) -> Self {
        Self {
            input,
            context,
            history,
        }
    }
}

pub type PromptFn = dyn Fn(&PromptInput<'_>) -> String + Send + Sync;

/// How the prompt sent to the model is produced on each turn.
///
/// A `Literal` is a Handlebars template over `{{input}}`, `{{context}}` and
/// `{{history}}`. A literal with no `{{` expressions is treated as a preamble
/// and laid out by [`PromptSpec::render`] with sections for the context, the
/// conversation so far and the new input.
#[derive(Clone)]
pub enum PromptSpec {
    Literal(String),
    Template(Arc<PromptFn>),
}

impl PromptSpec {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub fn template<F>(f: F) -> Self
    where
        F: Fn(&PromptInput<'_>) -> String + Send + Sync + 'static,
    {
        Self::Template(Arc::new(f))
    }

    /// Checks that a literal is a well-formed template.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            Self::Literal(text) => {
                let registry = registry(text)?;
                // A trial render surfaces unknown variables before the first turn.
                substitute(&registry, &PromptInput::new("", None, &[])).map(|_| ())
            }
            Self::Template(_) => Ok(()),
        }
    }

    pub fn render(&self, input: &PromptInput<'_>) -> Result<String, DomainError> {
        match self {
            Self::Template(f) => Ok(f(input)),
            Self::Literal(text) if has_expressions(text) => substitute(&registry(text)?, input),
            Self::Literal(text) => Ok(layout(text, input)),
        }
    }
}

impl fmt::Debug for PromptSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Self::Template(_) => f.write_str("Template(<fn>)"),
        }
    }
}

impl From<&str> for PromptSpec {
    fn from(text: &str) -> Self {
        Self::literal(text)
    }
}

impl From<String> for PromptSpec {
    fn from(text: String) -> Self {
        Self::Literal(text)
    }
}

/// Renders history as one `Speaker: text` line per message.
pub fn render_transcript(history: &[Message]) -> String {
    history
        .iter()
        .map(|msg| format!("{}: {}", speaker(msg.role()), msg.content()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn speaker(role: Role) -> &'static str {
    match role {
        Role::Human => "Human",
        Role::Ai => "AI",
        Role::System => "System",
    }
}

const PROMPT: &str = "prompt";

/// Handlebars registry for prompt literals. Strict mode turns a reference to
/// anything other than `input`, `context` or `history` into an error, and
/// output is not HTML-escaped since prompts are plain text.
fn registry<'a>(text: &str) -> Result<Handlebars<'a>, DomainError> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_escape_fn(handlebars::no_escape);
    registry
        .register_template_string(PROMPT, text)
        .map_err(|e| DomainError::configuration(format!("invalid prompt template: {}", e)))?;
    Ok(registry)
}

fn substitute(registry: &Handlebars<'_>, input: &PromptInput<'_>) -> Result<String, DomainError> {
    let data = json!({
        "input": input.input,
        "context": input.context.map(RetrievedContext::render).unwrap_or_default(),
        "history": render_transcript(input.history),
    });
    registry
        .render(PROMPT, &data)
        .map_err(|e| DomainError::configuration(format!("failed to render prompt: {}", e)))
}

fn has_expressions(text: &str) -> bool {
    text.contains("{{")
}

fn layout(preamble: &str, input: &PromptInput<'_>) -> String {
    let mut sections: Vec<String> = Vec::new();

    if !preamble.trim().is_empty() {
        sections.push(preamble.trim_end().to_string());
    }
    if let Some(context) = input.context.filter(|c| !c.is_empty()) {
        sections.push(format!("Context:\n{}", context.render()));
    }
    if !input.history.is_empty() {
        sections.push(format!("Conversation:\n{}", render_transcript(input.history)));
    }
    sections.push(format!("Human: {}\nAI:", input.input));

    sections.join("\n\n")
}
