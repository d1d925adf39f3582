use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Model invocation error: {0}")]
    ModelInvocation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DomainError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::Retrieval(msg.into())
    }

    pub fn model_invocation(msg: impl Into<String>) -> Self {
        Self::ModelInvocation(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_retrieval(&self) -> bool {
        matches!(self, Self::Retrieval(_))
    }

    pub fn is_model_invocation(&self) -> bool {
        matches!(self, Self::ModelInvocation(_))
    }

    /// Re-tags an error raised by a retriever so callers always see `Retrieval`.
    pub fn into_retrieval(self) -> Self {
        match self {
            Self::Retrieval(_) => self,
            other => Self::Retrieval(other.detail()),
        }
    }

    /// Re-tags an error raised by a language model so callers always see `ModelInvocation`.
    pub fn into_model_invocation(self) -> Self {
        match self {
            Self::ModelInvocation(_) => self,
            other => Self::ModelInvocation(other.detail()),
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::Configuration(msg)
            | Self::Retrieval(msg)
            | Self::ModelInvocation(msg)
            | Self::InvalidInput(msg) => msg.clone(),
            Self::Io(e) => e.to_string(),
        }
    }
}
