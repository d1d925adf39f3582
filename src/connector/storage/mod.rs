//! File-backed persistence for chat transcripts.

mod transcript_file;

pub use transcript_file::*;
