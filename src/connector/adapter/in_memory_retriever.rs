use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::application::Retriever;
use crate::domain::{ContextDocument, DomainError, Message, RetrievedContext};

const DEFAULT_LIMIT: usize = 5;

/// Query terms shorter than this are ignored when matching.
const MIN_TERM_LEN: usize = 3;

/// Retriever over a fixed set of documents held in memory.
///
/// A document matches when it shares at least one term with the query
/// (case-insensitive, terms of three or more characters). Matches are
/// returned in insertion order, capped at the configured limit; there is no
/// scoring.
pub struct InMemoryRetriever {
    documents: RwLock<Vec<ContextDocument>>,
    limit: usize,
}

impl InMemoryRetriever {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_document(mut self, document: ContextDocument) -> Self {
        self.documents.get_mut().push(document);
        self
    }

    pub fn with_documents(mut self, documents: impl IntoIterator<Item = ContextDocument>) -> Self {
        self.documents.get_mut().extend(documents);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        // Ensure at least 1 document can be returned
        self.limit = limit.max(1);
        self
    }

    /// Splits `text` into blank-line separated paragraphs, one document each.
    /// Every document records `source` as `<source>#<n>` (1-based).
    /// Windows line endings are normalized first.
    pub fn from_text(text: &str, source: &str) -> Self {
        let text = text.replace("\r\n", "\n");
        let documents = text
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .enumerate()
            .map(|(i, p)| ContextDocument::new(p).with_metadata("source", format!("{}#{}", source, i + 1)));

        Self::new().with_documents(documents)
    }

    pub fn from_file(path: &Path) -> Result<Self, DomainError> {
        let text = std::fs::read_to_string(path)?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::from_text(&text, &source))
    }

    pub async fn add(&self, document: ContextDocument) {
        self.documents.write().await.push(document);
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    fn terms(text: &str) -> HashSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.chars().count() >= MIN_TERM_LEN)
            .map(str::to_lowercase)
            .collect()
    }
}

impl Default for InMemoryRetriever {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Retriever for InMemoryRetriever {
    async fn fetch(
        &self,
        query: &str,
        _history: &[Message],
    ) -> Result<RetrievedContext, DomainError> {
        let query_terms = Self::terms(query);
        if query_terms.is_empty() {
            return Ok(RetrievedContext::documents(vec![]));
        }

        let documents = self.documents.read().await;
        let matches: Vec<ContextDocument> = documents
            .iter()
            .filter(|doc| !Self::terms(doc.content()).is_disjoint(&query_terms))
            .take(self.limit)
            .cloned()
            .collect();

        debug!(
            "InMemoryRetriever matched {} of {} documents",
            matches.len(),
            documents.len()
        );

        Ok(RetrievedContext::documents(matches))
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journal() -> InMemoryRetriever {
        InMemoryRetriever::new().with_documents([
            ContextDocument::new("Birthday: stayed at home and watched TV."),
            ContextDocument::new("Went hiking on Saturday."),
            ContextDocument::new("Birthday cake was chocolate."),
        ])
    }

    #[tokio::test]
    async fn test_fetch_matches_terms_in_order() {
        let context = journal()
            .fetch("What did I do on my BIRTHDAY?", &[])
            .await
            .unwrap();

        match context {
            RetrievedContext::Documents(docs) => {
                assert_eq!(docs.len(), 2);
                assert!(docs[0].content().starts_with("Birthday: stayed"));
                assert!(docs[1].content().starts_with("Birthday cake"));
            }
            other => panic!("unexpected context {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_respects_limit() {
        let context = journal().with_limit(1).fetch("birthday", &[]).await.unwrap();
        assert_eq!(context, RetrievedContext::documents(vec![ContextDocument::new(
            "Birthday: stayed at home and watched TV."
        )]));
    }

    #[tokio::test]
    async fn test_short_terms_match_nothing() {
        let context = journal().fetch("I do", &[]).await.unwrap();
        assert!(context.is_empty());
    }

    #[tokio::test]
    async fn test_add_document() {
        let retriever = InMemoryRetriever::new();
        assert!(retriever.is_empty().await);

        retriever.add(ContextDocument::new("Paris is in France.")).await;

        assert_eq!(retriever.len().await, 1);
        assert!(!retriever.fetch("france", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_from_text_splits_paragraphs() {
        let retriever = InMemoryRetriever::from_text("first note\n\n\n\nsecond note\n", "notes.md");
        assert_eq!(retriever.len().await, 2);

        let context = retriever.fetch("second", &[]).await.unwrap();
        assert_eq!(context.render(), "[notes.md#2]\nsecond note");
    }

    #[tokio::test]
    async fn test_from_text_handles_crlf_line_endings() {
        let retriever =
            InMemoryRetriever::from_text("first note\r\nstill first\r\n\r\nsecond note\r\n", "notes.md");
        assert_eq!(retriever.len().await, 2);

        let context = retriever.fetch("still", &[]).await.unwrap();
        assert_eq!(context.render(), "[notes.md#1]\nfirst note\nstill first");
    }
}
