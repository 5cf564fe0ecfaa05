use crate::application::ports::text_indexer::TextIndexer;
use crate::domain::documents::document::{Document, DocumentQuery};

#[derive(Debug, Clone)]
pub struct SearchResults {
    pub total: u64,
    pub offset: u64,
    pub documents: Vec<Document>,
}

pub struct SearchDocuments<'a, I: TextIndexer + ?Sized> {
    pub indexer: &'a I,
}

impl<'a, I: TextIndexer + ?Sized> SearchDocuments<'a, I> {
    /// Collects at most `limit` results starting at the query offset.
    pub async fn execute(&self, query: DocumentQuery, limit: usize) -> anyhow::Result<SearchResults> {
        let mut it = self.indexer.search(&query).await?;
        let mut documents = Vec::with_capacity(limit.min(64));
        while documents.len() < limit && it.next().await {
            documents.push(it.document().clone());
        }
        if let Some(e) = it.error() {
            anyhow::bail!("search failed: {e}");
        }
        it.close().await?;
        Ok(SearchResults {
            total: it.total_count(),
            offset: query.offset,
            documents,
        })
    }
}
