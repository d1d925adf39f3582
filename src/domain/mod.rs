//! # Domain Layer
//!
//! Chat messages, prompts, retrieved context and the error taxonomy.
//! This layer performs no I/O and knows nothing about concrete models or retrievers.

mod error;
pub mod models;
pub mod services;

pub use error::*;
pub use models::*;
pub use services::*;
