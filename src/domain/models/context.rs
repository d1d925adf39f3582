use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A piece of supporting material returned by a retriever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDocument {
    content: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, String>,
}

impl ContextDocument {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").map(String::as_str)
    }
}

/// Whatever a retriever hands back for a query. The orchestrator never looks
/// inside; only the prompt specification consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum RetrievedContext {
    Text(String),
    Documents(Vec<ContextDocument>),
}

impl RetrievedContext {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn documents(documents: Vec<ContextDocument>) -> Self {
        Self::Documents(documents)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Documents(docs) => docs.is_empty(),
        }
    }

    /// Flattens the context into prompt text. Documents are separated by a
    /// blank line and prefixed with their `source` when one is recorded.
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Documents(docs) => docs
                .iter()
                .map(|doc| match doc.source() {
                    Some(source) => format!("[{}]\n{}", source, doc.content()),
                    None => doc.content().to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }
}
