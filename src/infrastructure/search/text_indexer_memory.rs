use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::ports::text_indexer::{
    DocumentIterator, IndexError, SearchPage, SearchPageSource, TextIndexer,
};
use crate::application::search::PagedDocumentIterator;
use crate::domain::documents::document::{Document, DocumentQuery};
use crate::infrastructure::search::TantivyEngine;

struct IndexState {
    docs: RwLock<HashMap<Uuid, Document>>,
    engine: TantivyEngine,
}

/// Document index held in process memory: the map keeps the authoritative
/// copies, the tantivy engine answers full-text queries over them.
#[derive(Clone)]
pub struct InMemoryTextIndexer {
    state: Arc<IndexState>,
}

impl InMemoryTextIndexer {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            state: Arc::new(IndexState {
                docs: RwLock::new(HashMap::new()),
                engine: TantivyEngine::new()?,
            }),
        })
    }
}

#[async_trait]
impl TextIndexer for InMemoryTextIndexer {
    async fn index(&self, doc: &mut Document) -> Result<(), IndexError> {
        if doc.link_id.is_nil() {
            return Err(IndexError::MissingLinkId);
        }
        if !doc.page_rank.is_finite() {
            return Err(IndexError::InvalidScore);
        }
        doc.indexed_at = Some(Utc::now().trunc_subsecs(6));

        let mut docs = self.state.docs.write().await;
        let mut stored = doc.clone();
        if let Some(existing) = docs.get(&doc.link_id) {
            stored.page_rank = existing.page_rank;
        }
        self.state
            .engine
            .upsert(stored.link_id, &stored.title, &stored.content, stored.page_rank)
            .map_err(|e| IndexError::backend("index", e))?;
        docs.insert(stored.link_id, stored);
        tracing::debug!(link_id = %doc.link_id, "document_indexed");
        Ok(())
    }

    async fn find_by_id(&self, link_id: Uuid) -> Result<Document, IndexError> {
        let docs = self.state.docs.read().await;
        docs.get(&link_id).cloned().ok_or(IndexError::NotFound)
    }

    async fn update_score(&self, link_id: Uuid, score: f64) -> Result<(), IndexError> {
        if !score.is_finite() {
            return Err(IndexError::InvalidScore);
        }
        let mut docs = self.state.docs.write().await;
        let mut updated = docs
            .get(&link_id)
            .cloned()
            .unwrap_or_else(|| Document::placeholder(link_id, score));
        updated.page_rank = score;
        self.state
            .engine
            .upsert(link_id, &updated.title, &updated.content, score)
            .map_err(|e| IndexError::backend("update score", e))?;
        docs.insert(link_id, updated);
        Ok(())
    }

    async fn search(&self, query: &DocumentQuery) -> Result<Box<dyn DocumentIterator>, IndexError> {
        let it = PagedDocumentIterator::start(self.state.clone(), query.clone()).await?;
        Ok(Box::new(it))
    }
}

#[async_trait]
impl SearchPageSource for IndexState {
    async fn fetch_page(
        &self,
        query: &DocumentQuery,
        from: u64,
        size: usize,
    ) -> Result<SearchPage, IndexError> {
        let docs = self.docs.read().await;
        let (total, keys) = self
            .engine
            .search_page(query, from, size)
            .map_err(|e| IndexError::backend("search", e))?;
        let documents = keys
            .iter()
            .filter_map(|key| docs.get(key).cloned())
            .collect();
        Ok(SearchPage { total, documents })
    }
}
