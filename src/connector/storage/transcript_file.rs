//! JSON transcript files.
//!
//! A transcript is an array of `[actor, text]` pairs:
//!
//! ```json
//! [
//!   ["human", "What did I do on my birthday?"],
//!   ["system", "The user stayed at home all day and watched TV."],
//!   ["ai", "Sounds like you had a great time on your birthday!"]
//! ]
//! ```
//!
//! Loading goes through [`normalize`], so unrecognized actors are dropped.

use std::path::Path;

use tracing::debug;

use crate::domain::{normalize, DomainError, Message};

pub fn load_transcript(path: &Path) -> Result<Vec<Message>, DomainError> {
    let raw = std::fs::read_to_string(path)?;
    let turns: Vec<(String, String)> = serde_json::from_str(&raw).map_err(|e| {
        DomainError::invalid_input(format!("{}: not a transcript: {}", path.display(), e))
    })?;

    let total = turns.len();
    let history = normalize(turns);
    debug!(
        "Loaded {} of {} turns from {}",
        history.len(),
        total,
        path.display()
    );
    Ok(history)
}

pub fn save_transcript(path: &Path, history: &[Message]) -> Result<(), DomainError> {
    let turns: Vec<(&str, &str)> = history
        .iter()
        .map(|msg| (msg.role().as_str(), msg.content()))
        .collect();
    let json = serde_json::to_string_pretty(&turns)
        .map_err(|e| DomainError::invalid_input(format!("cannot encode transcript: {}", e)))?;

    std::fs::write(path, json)?;
    debug!("Saved {} messages to {}", history.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_normalizes_turns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(
            &path,
            r#"[["Human", "Hello"], ["narrator", "skip me"], ["AI", "Hi there"]]"#,
        )
        .unwrap();

        let history = load_transcript(&path).unwrap();

        assert_eq!(history, vec![Message::human("Hello"), Message::ai("Hi there")]);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        let history = vec![
            Message::system("notes"),
            Message::human("question"),
            Message::ai("answer"),
        ];

        save_transcript(&path, &history).unwrap();

        assert_eq!(load_transcript(&path).unwrap(), history);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_transcript(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, DomainError::Io(_)));
    }

    #[test]
    fn test_malformed_file_is_invalid_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"human": "hello"}"#).unwrap();

        let err = load_transcript(&path).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }
}
