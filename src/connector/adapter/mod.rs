mod anthropic_model;
mod in_memory_retriever;
mod mock_language_model;

pub use anthropic_model::*;
pub use in_memory_retriever::*;
pub use mock_language_model::*;
