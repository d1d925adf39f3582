//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - Language models (Anthropic Messages API, deterministic mock)
//! - Retrieval (in-memory documents)
//! - Storage (JSON transcript files)

pub mod adapter;
pub mod storage;

pub use adapter::*;
pub use storage::*;
