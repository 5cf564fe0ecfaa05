use chrono::{DateTime, Utc};

use crate::application::linkgraph::{self, CrawlSummary, CrawledPage};
use crate::application::ports::linkgraph_repository::LinkGraphRepository;

pub struct RecordCrawl<'a, R: LinkGraphRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: LinkGraphRepository + ?Sized> RecordCrawl<'a, R> {
    /// `started_at` defaults to the moment recording begins, which evicts
    /// every edge of the page not observed in this crawl.
    pub async fn execute(
        &self,
        page: &CrawledPage,
        started_at: Option<DateTime<Utc>>,
    ) -> anyhow::Result<CrawlSummary> {
        if page.url.trim().is_empty() {
            anyhow::bail!("url must not be empty");
        }
        let started_at = started_at.unwrap_or_else(Utc::now);
        Ok(linkgraph::record_crawl(self.repo, page, started_at).await?)
    }
}
