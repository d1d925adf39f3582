mod context;
mod message;
mod prompt;

pub use context::*;
pub use message::*;
pub use prompt::*;
