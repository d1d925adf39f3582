//! Pure domain services.

mod history_normalizer;

pub use history_normalizer::*;
