use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::documents::document::{Document, DocumentQuery};

#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    #[error("not found")]
    NotFound,
    #[error("document does not provide a valid link id")]
    MissingLinkId,
    #[error("page rank must be a finite number")]
    InvalidScore,
    #[error("{op}: backend failure")]
    Backend {
        op: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl IndexError {
    pub fn backend(op: &'static str, source: impl Into<anyhow::Error>) -> Self {
        IndexError::Backend {
            op,
            source: source.into(),
        }
    }
}

#[async_trait]
pub trait TextIndexer: Send + Sync {
    /// Indexes `doc`, replacing the content of any document stored under the
    /// same link id while keeping its PageRank. Sets `doc.indexed_at`.
    async fn index(&self, doc: &mut Document) -> Result<(), IndexError>;

    async fn find_by_id(&self, link_id: Uuid) -> Result<Document, IndexError>;

    /// Sets the PageRank of a document, creating an empty placeholder when
    /// the link has not been indexed yet. NaN and infinite scores are
    /// rejected with `InvalidScore`.
    async fn update_score(&self, link_id: Uuid, score: f64) -> Result<(), IndexError>;

    async fn search(&self, query: &DocumentQuery) -> Result<Box<dyn DocumentIterator>, IndexError>;
}

#[async_trait]
pub trait DocumentIterator: Send {
    async fn next(&mut self) -> bool;
    fn document(&self) -> &Document;
    fn error(&self) -> Option<&IndexError>;
    async fn close(&mut self) -> Result<(), IndexError>;
    /// Total number of matches; 0 until a page has been fetched.
    fn total_count(&self) -> u64;
}

#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub total: u64,
    pub documents: Vec<Document>,
}

/// Ranked, paged access to the full-text capability behind an indexer.
#[async_trait]
pub trait SearchPageSource: Send + Sync {
    async fn fetch_page(
        &self,
        query: &DocumentQuery,
        from: u64,
        size: usize,
    ) -> Result<SearchPage, IndexError>;
}
