use async_trait::async_trait;

use crate::domain::{DomainError, Message, RetrievedContext};

/// Supplies context relevant to the user's latest message.
///
/// The returned context is opaque to the chat use case and is only consumed
/// by the prompt specification.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn fetch(
        &self,
        query: &str,
        history: &[Message],
    ) -> Result<RetrievedContext, DomainError>;

    fn name(&self) -> &str;
}
