mod chat;
mod chat_session;

pub use chat::*;
pub use chat_session::*;
