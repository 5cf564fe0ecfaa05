use uuid::Uuid;

use crate::application::ports::text_indexer::TextIndexer;

pub struct UpdateScore<'a, I: TextIndexer + ?Sized> {
    pub indexer: &'a I,
}

impl<'a, I: TextIndexer + ?Sized> UpdateScore<'a, I> {
    pub async fn execute(&self, link_id: Uuid, score: f64) -> anyhow::Result<()> {
        if !score.is_finite() {
            anyhow::bail!("score must be a finite number");
        }
        self.indexer.update_score(link_id, score).await?;
        Ok(())
    }
}
