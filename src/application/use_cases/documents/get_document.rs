use uuid::Uuid;

use crate::application::ports::text_indexer::{IndexError, TextIndexer};
use crate::domain::documents::document::Document;

pub struct GetDocument<'a, I: TextIndexer + ?Sized> {
    pub indexer: &'a I,
}

impl<'a, I: TextIndexer + ?Sized> GetDocument<'a, I> {
    pub async fn execute(&self, link_id: Uuid) -> anyhow::Result<Option<Document>> {
        match self.indexer.find_by_id(link_id).await {
            Ok(doc) => Ok(Some(doc)),
            Err(IndexError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
