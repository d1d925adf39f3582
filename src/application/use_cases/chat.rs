use std::time::Instant;

use futures_util::StreamExt;
use tracing::{debug, info, warn};

use crate::application::{ChatSessionConfig, ReplyStream};
use crate::domain::{DomainError, Message, PromptInput, RetrievedContext};

/// Stages a single chat turn moves through. A failure in any stage ends the
/// turn; `Retrieving` is skipped when no retriever is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Retrieving,
    PromptAssembling,
    ModelInvoking,
}

impl TurnPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnPhase::Retrieving => "retrieving",
            TurnPhase::PromptAssembling => "prompt-assembling",
            TurnPhase::ModelInvoking => "model-invoking",
        }
    }

    fn fail(self, err: DomainError) -> DomainError {
        warn!("Chat turn failed while {}: {}", self.as_str(), err);
        match self {
            TurnPhase::Retrieving => err.into_retrieval(),
            TurnPhase::ModelInvoking => err.into_model_invocation(),
            TurnPhase::PromptAssembling => err,
        }
    }
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runs chat turns against a [`ChatSessionConfig`].
///
/// The use case keeps no conversation state: history is owned by the caller
/// and only the `*_and_update_history` variants write to it, appending the
/// human turn and the reply together once the whole turn has succeeded.
pub struct ChatUseCase {
    config: ChatSessionConfig,
}

impl ChatUseCase {
    pub fn new(config: ChatSessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChatSessionConfig {
        &self.config
    }

    /// Answer `user_input` given the prior `history`, without modifying it.
    pub async fn chat(&self, user_input: &str, history: &[Message]) -> Result<String, DomainError> {
        let start_time = Instant::now();
        let prompt = self.prepare_prompt(user_input, history).await?;

        let reply = self
            .config
            .model()
            .invoke(&prompt)
            .await
            .map_err(|e| TurnPhase::ModelInvoking.fail(e))?;

        info!(
            "Chat turn completed with {} in {:.2}s ({} chars)",
            self.config.model().model_name(),
            start_time.elapsed().as_secs_f64(),
            reply.len()
        );

        Ok(reply)
    }

    /// Like [`ChatUseCase::chat`], then appends `Human(user_input)` and
    /// `Ai(reply)` to `history`. On error `history` is left untouched.
    pub async fn chat_and_update_history(
        &self,
        user_input: &str,
        history: &mut Vec<Message>,
    ) -> Result<String, DomainError> {
        let reply = self.chat(user_input, history).await?;
        append_turn(history, user_input, &reply);
        Ok(reply)
    }

    /// Answer `user_input` as a stream of reply fragments.
    ///
    /// Retrieval and prompt assembly complete before this returns; the model
    /// is then pulled lazily as the stream is polled. Errors while streaming
    /// arrive as `ModelInvocation` items.
    pub async fn stream(
        &self,
        user_input: &str,
        history: &[Message],
    ) -> Result<ReplyStream, DomainError> {
        let prompt = self.prepare_prompt(user_input, history).await?;

        let stream = self
            .config
            .model()
            .invoke_streaming(&prompt)
            .await
            .map_err(|e| TurnPhase::ModelInvoking.fail(e))?;

        debug!(
            "Streaming reply from {}",
            self.config.model().model_name()
        );

        Ok(stream
            .map(|fragment| fragment.map_err(DomainError::into_model_invocation))
            .boxed())
    }

    /// Drive [`ChatUseCase::stream`] to completion, handing each fragment to
    /// `on_fragment` as it arrives. The turn is appended to `history` only if
    /// the whole stream succeeds.
    pub async fn stream_and_update_history<F>(
        &self,
        user_input: &str,
        history: &mut Vec<Message>,
        mut on_fragment: F,
    ) -> Result<String, DomainError>
    where
        F: FnMut(&str),
    {
        let mut stream = self.stream(user_input, history).await?;
        let mut reply = String::new();

        while let Some(fragment) = stream.next().await {
            let fragment = fragment.map_err(|e| TurnPhase::ModelInvoking.fail(e))?;
            on_fragment(&fragment);
            reply.push_str(&fragment);
        }

        append_turn(history, user_input, &reply);
        Ok(reply)
    }

    async fn prepare_prompt(
        &self,
        user_input: &str,
        history: &[Message],
    ) -> Result<String, DomainError> {
        let context = self.retrieve(user_input, history).await?;

        let prompt = self
            .config
            .prompt()
            .render(&PromptInput::new(user_input, context.as_ref(), history))
            .map_err(|e| TurnPhase::PromptAssembling.fail(e))?;

        debug!("Assembled prompt of {} chars", prompt.len());
        Ok(prompt)
    }

    async fn retrieve(
        &self,
        user_input: &str,
        history: &[Message],
    ) -> Result<Option<RetrievedContext>, DomainError> {
        let Some(retriever) = self.config.retriever() else {
            return Ok(None);
        };

        let context = retriever
            .fetch(user_input, history)
            .await
            .map_err(|e| TurnPhase::Retrieving.fail(e))?;

        debug!(
            "Retriever {} returned {} context",
            retriever.name(),
            if context.is_empty() { "empty" } else { "non-empty" }
        );
        Ok(Some(context))
    }
}

fn append_turn(history: &mut Vec<Message>, user_input: &str, reply: &str) {
    history.reserve(2);
    history.push(Message::human(user_input));
    history.push(Message::ai(reply));
}
