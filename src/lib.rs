pub mod application;
pub mod connector;
pub mod domain;

pub use application::{
    ChatSessionConfig, ChatSessionConfigBuilder, ChatUseCase, LanguageModel, ReplyStream,
    Retriever, TurnPhase,
};

pub use connector::{
    load_transcript, save_transcript, AnthropicModel, InMemoryRetriever, MockLanguageModel,
};

pub use domain::{
    normalize, render_transcript, ContextDocument, DomainError, Message, PromptInput, PromptSpec,
    RetrievedContext, Role,
};
