//! # Application Layer
//!
//! Collaborator interfaces and the chat use cases that orchestrate them.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
