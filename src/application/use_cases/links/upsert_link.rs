use chrono::{DateTime, Utc};

use crate::application::ports::linkgraph_repository::LinkGraphRepository;
use crate::domain::graph::Link;

pub struct UpsertLink<'a, R: LinkGraphRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: LinkGraphRepository + ?Sized> UpsertLink<'a, R> {
    pub async fn execute(
        &self,
        url: &str,
        retrieved_at: Option<DateTime<Utc>>,
    ) -> anyhow::Result<Link> {
        let url = url.trim();
        if url.is_empty() {
            anyhow::bail!("url must not be empty");
        }
        let mut link = Link {
            retrieved_at,
            ..Link::new(url)
        };
        self.repo.upsert_link(&mut link).await?;
        Ok(link)
    }
}
