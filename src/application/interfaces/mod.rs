mod language_model;
mod retriever;

pub use language_model::*;
pub use retriever::*;
