use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use tracing::debug;

use crate::application::{LanguageModel, ReplyStream};
use crate::domain::DomainError;

/// Deterministic stand-in for a remote model.
///
/// Replies with a fixed text when one is configured, otherwise echoes the
/// prompt back as `Echo: <prompt>`. Streaming splits the same reply after
/// each whitespace character, so the fragments always concatenate to the
/// non-streaming reply.
pub struct MockLanguageModel {
    reply: Option<String>,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self { reply: None }
    }

    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
        }
    }

    fn reply_for(&self, prompt: &str) -> String {
        match &self.reply {
            Some(reply) => reply.clone(),
            None => format!("Echo: {}", prompt),
        }
    }

    fn fragments(reply: &str) -> Vec<String> {
        reply
            .split_inclusive(char::is_whitespace)
            .map(str::to_string)
            .collect()
    }
}

impl Default for MockLanguageModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn invoke(&self, prompt: &str) -> Result<String, DomainError> {
        let reply = self.reply_for(prompt);
        debug!("MockLanguageModel replying with {} chars", reply.len());
        Ok(reply)
    }

    async fn invoke_streaming(&self, prompt: &str) -> Result<ReplyStream, DomainError> {
        let fragments = Self::fragments(&self.reply_for(prompt));
        debug!("MockLanguageModel streaming {} fragments", fragments.len());
        Ok(stream::iter(fragments.into_iter().map(Ok)).boxed())
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
