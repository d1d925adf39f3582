use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::domain::DomainError;

/// Fragments of a reply, in the order the model produced them.
///
/// The stream owns whatever the model holds open for the reply (an HTTP
/// response body, a buffer); dropping it before the end releases them.
pub type ReplyStream = BoxStream<'static, Result<String, DomainError>>;

/// A language model that turns a rendered prompt into a reply.
///
/// Implementors encapsulate transport, serialization, and vendor-specific API
/// details. Failures should be reported as [`DomainError::ModelInvocation`].
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send the prompt and wait for the complete reply text.
    async fn invoke(&self, prompt: &str) -> Result<String, DomainError>;

    /// Send the prompt and receive the reply incrementally.
    ///
    /// Concatenating every fragment must yield what [`LanguageModel::invoke`]
    /// would have returned for the same prompt and model state.
    async fn invoke_streaming(&self, prompt: &str) -> Result<ReplyStream, DomainError>;

    /// Get the model name used for logging
    fn model_name(&self) -> &str;
}
