use serde::{Deserialize, Serialize};

/// The speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Ai,
    System,
}

impl Role {
    /// Resolves an actor label such as `"Human"` or `"AI"`, ignoring case.
    /// Returns `None` for labels that name no role, including padded ones.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "human" => Some(Role::Human),
            "ai" => Some(Role::Ai),
            "system" => Some(Role::System),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Human => "human",
            Role::Ai => "ai",
            Role::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single typed entry of a chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum Message {
    Human(String),
    Ai(String),
    System(String),
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Self::Human(content.into())
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::Ai(content.into())
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    pub fn new(role: Role, content: impl Into<String>) -> Self {
        match role {
            Role::Human => Self::human(content),
            Role::Ai => Self::ai(content),
            Role::System => Self::system(content),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::Human(_) => Role::Human,
            Self::Ai(_) => Role::Ai,
            Self::System(_) => Role::System,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Human(text) | Self::Ai(text) | Self::System(text) => text,
        }
    }

    pub fn is_human(&self) -> bool {
        matches!(self, Self::Human(_))
    }

    pub fn is_ai(&self) -> bool {
        matches!(self, Self::Ai(_))
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Self::System(_))
    }

    pub fn display_line(&self) -> String {
        format!("{}: {}", self.role(), self.content())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_label() {
        assert_eq!(Role::from_label("human"), Some(Role::Human));
        assert_eq!(Role::from_label("AI"), Some(Role::Ai));
        assert_eq!(Role::from_label("System"), Some(Role::System));
        assert_eq!(Role::from_label(" human"), None);
        assert_eq!(Role::from_label("ai "), None);
        assert_eq!(Role::from_label("assistant"), None);
        assert_eq!(Role::from_label(""), None);
    }

    #[test]
    fn test_message_accessors() {
        let msg = Message::new(Role::Ai, "Hi there");

        assert!(msg.is_ai());
        assert!(!msg.is_human());
        assert_eq!(msg.role(), Role::Ai);
        assert_eq!(msg.content(), "Hi there");
        assert_eq!(msg.display_line(), "ai: Hi there");
    }

    #[test]
    fn test_message_serializes_with_role_tag() {
        let json = serde_json::to_value(Message::system("be brief")).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "be brief");

        let parsed: Message =
            serde_json::from_str(r#"{"role":"human","content":"hello"}"#).unwrap();
        assert_eq!(parsed, Message::human("hello"));
    }
}
