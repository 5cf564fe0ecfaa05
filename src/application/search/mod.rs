use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::text_indexer::{
    DocumentIterator, IndexError, SearchPageSource,
};
use crate::domain::documents::document::{Document, DocumentQuery};

/// Number of results requested from the search backend per round trip.
pub const SEARCH_PAGE_SIZE: usize = 10;

/// Walks a ranked result set page by page. Pages are pulled from the source
/// only when the previous one has been consumed.
pub struct PagedDocumentIterator<S: SearchPageSource + ?Sized> {
    source: Option<Arc<S>>,
    query: DocumentQuery,
    page: Vec<Document>,
    page_from: u64,
    page_idx: usize,
    // absolute position of the next result, offset included
    cursor: u64,
    total: u64,
    current: Document,
    last_err: Option<IndexError>,
}

impl<S: SearchPageSource + ?Sized> PagedDocumentIterator<S> {
    /// Runs the query and buffers its first page so that query errors are
    /// reported here rather than on the first `next`.
    pub async fn start(source: Arc<S>, query: DocumentQuery) -> Result<Self, IndexError> {
        let first = source
            .fetch_page(&query, query.offset, SEARCH_PAGE_SIZE)
            .await?;
        tracing::debug!(
            expression = %query.expression,
            offset = query.offset,
            total = first.total,
            "search_started"
        );
        Ok(Self {
            source: Some(source),
            page_from: query.offset,
            cursor: query.offset,
            query,
            page: first.documents,
            page_idx: 0,
            total: first.total,
            current: Document::default(),
            last_err: None,
        })
    }

    async fn fetch_next_page(&mut self) -> bool {
        let Some(source) = self.source.as_ref() else {
            return false;
        };
        let from = self.page_from + SEARCH_PAGE_SIZE as u64;
        match source.fetch_page(&self.query, from, SEARCH_PAGE_SIZE).await {
            Ok(page) => {
                self.page_from = from;
                self.page_idx = 0;
                self.total = page.total;
                self.page = page.documents;
                !self.page.is_empty()
            }
            Err(e) => {
                tracing::warn!(error = ?e, from, "search_page_fetch_failed");
                self.last_err = Some(e);
                false
            }
        }
    }
}

#[async_trait]
impl<S: SearchPageSource + ?Sized> DocumentIterator for PagedDocumentIterator<S> {
    async fn next(&mut self) -> bool {
        if self.last_err.is_some() || self.source.is_none() || self.cursor >= self.total {
            return false;
        }
        if self.page_idx >= self.page.len() && !self.fetch_next_page().await {
            return false;
        }

        self.current = std::mem::take(&mut self.page[self.page_idx]);
        self.page_idx += 1;
        self.cursor += 1;
        true
    }

    fn document(&self) -> &Document {
        &self.current
    }

    fn error(&self) -> Option<&IndexError> {
        self.last_err.as_ref()
    }

    async fn close(&mut self) -> Result<(), IndexError> {
        self.source = None;
        self.page = Vec::new();
        self.cursor = self.total;
        Ok(())
    }

    fn total_count(&self) -> u64 {
        self.total
    }
}
