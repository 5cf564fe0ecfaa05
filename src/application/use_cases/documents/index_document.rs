use uuid::Uuid;

use crate::application::ports::text_indexer::TextIndexer;
use crate::domain::documents::document::Document;

pub struct IndexDocument<'a, I: TextIndexer + ?Sized> {
    pub indexer: &'a I,
}

impl<'a, I: TextIndexer + ?Sized> IndexDocument<'a, I> {
    pub async fn execute(
        &self,
        link_id: Uuid,
        url: String,
        title: String,
        content: String,
    ) -> anyhow::Result<Document> {
        let mut doc = Document {
            link_id,
            url,
            title,
            content,
            ..Document::default()
        };
        self.indexer.index(&mut doc).await?;
        // The stored copy carries the authoritative rank
        Ok(self.indexer.find_by_id(link_id).await?)
    }
}
