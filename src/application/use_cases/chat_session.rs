use std::fmt;
use std::sync::Arc;

use crate::application::{LanguageModel, Retriever};
use crate::domain::{DomainError, PromptSpec};

/// The collaborators a conversation runs against.
///
/// Built once through [`ChatSessionConfig::builder`] and never changed
/// afterwards; build a new configuration to switch model or prompt.
#[derive(Clone)]
pub struct ChatSessionConfig {
    model: Arc<dyn LanguageModel>,
    prompt: PromptSpec,
    retriever: Option<Arc<dyn Retriever>>,
}

impl ChatSessionConfig {
    pub fn builder() -> ChatSessionConfigBuilder {
        ChatSessionConfigBuilder::default()
    }

    pub fn new(
        model: Arc<dyn LanguageModel>,
        prompt: impl Into<PromptSpec>,
        retriever: Option<Arc<dyn Retriever>>,
    ) -> Result<Self, DomainError> {
        let mut builder = Self::builder().model(model).prompt(prompt);
        if let Some(retriever) = retriever {
            builder = builder.retriever(retriever);
        }
        builder.build()
    }

    pub fn model(&self) -> &Arc<dyn LanguageModel> {
        &self.model
    }

    pub fn prompt(&self) -> &PromptSpec {
        &self.prompt
    }

    pub fn retriever(&self) -> Option<&Arc<dyn Retriever>> {
        self.retriever.as_ref()
    }

    pub fn has_retriever(&self) -> bool {
        self.retriever.is_some()
    }
}

impl fmt::Debug for ChatSessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSessionConfig")
            .field("model", &self.model.model_name())
            .field("prompt", &self.prompt)
            .field("retriever", &self.retriever.as_ref().map(|r| r.name()))
            .finish()
    }
}

#[derive(Default)]
pub struct ChatSessionConfigBuilder {
    model: Option<Arc<dyn LanguageModel>>,
    prompt: Option<PromptSpec>,
    retriever: Option<Arc<dyn Retriever>>,
}

impl ChatSessionConfigBuilder {
    pub fn model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn prompt(mut self, prompt: impl Into<PromptSpec>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Validates the collected fields. The model and prompt are required and
    /// a literal prompt must be a well-formed template.
    pub fn build(self) -> Result<ChatSessionConfig, DomainError> {
        let model = self
            .model
            .ok_or_else(|| DomainError::configuration("a language model is required"))?;
        let prompt = self
            .prompt
            .ok_or_else(|| DomainError::configuration("a prompt specification is required"))?;
        prompt.validate()?;

        Ok(ChatSessionConfig {
            model,
            prompt,
            retriever: self.retriever,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{InMemoryRetriever, MockLanguageModel};

    #[test]
    fn test_missing_model_is_rejected() {
        let err = ChatSessionConfig::builder()
            .prompt("You are helpful.")
            .build()
            .unwrap_err();

        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_prompt_is_rejected() {
        let err = ChatSessionConfig::builder()
            .model(Arc::new(MockLanguageModel::new()))
            .build()
            .unwrap_err();

        assert!(err.is_configuration());
    }

    #[test]
    fn test_malformed_prompt_is_rejected() {
        let result = ChatSessionConfig::new(
            Arc::new(MockLanguageModel::new()),
            "Answer {{question}}",
            None,
        );
        assert!(result.unwrap_err().is_configuration());

        let result = ChatSessionConfig::builder()
            .model(Arc::new(MockLanguageModel::new()))
            .prompt("{{#if context}}{{context}}")
            .build();
        assert!(result.unwrap_err().is_configuration());
    }

    #[test]
    fn test_retriever_is_optional() {
        let config =
            ChatSessionConfig::new(Arc::new(MockLanguageModel::new()), "Be brief.", None).unwrap();
        assert!(!config.has_retriever());

        let config = ChatSessionConfig::builder()
            .model(Arc::new(MockLanguageModel::new()))
            .prompt(PromptSpec::template(|p| p.input.to_string()))
            .retriever(Arc::new(InMemoryRetriever::new()))
            .build()
            .unwrap();
        assert!(config.has_retriever());
        assert_eq!(config.retriever().map(|r| r.name()), Some("in-memory"));
    }
}
