use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::application::ports::linkgraph_repository::{GraphError, LinkGraphRepository};
use crate::domain::graph::{Edge, Link};

/// Outcome of a single page fetch as reported by a crawler.
#[derive(Debug, Clone)]
pub struct CrawledPage {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub outgoing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSummary {
    pub link: Link,
    pub discovered: usize,
}

fn outgoing_urls<'a>(page: &'a CrawledPage) -> Vec<&'a str> {
    let own = page.url.trim();
    let mut seen = HashSet::new();
    page.outgoing
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty() && *u != own)
        .filter(|u| seen.insert(*u))
        .collect()
}

/// Records a crawled page and the links found on it. Edges that the page no
/// longer carries, i.e. not refreshed since `crawl_started_at`, are dropped.
pub async fn record_crawl<R: LinkGraphRepository + ?Sized>(
    repo: &R,
    page: &CrawledPage,
    crawl_started_at: DateTime<Utc>,
) -> Result<CrawlSummary, GraphError> {
    let mut link = Link::retrieved(page.url.trim(), page.fetched_at);
    repo.upsert_link(&mut link).await?;

    let targets = outgoing_urls(page);
    for url in &targets {
        // Discovered links stay unfetched until a crawler visits them
        let mut dst = Link::new(*url);
        repo.upsert_link(&mut dst).await?;
        repo.upsert_edge(&mut Edge::new(link.id, dst.id)).await?;
    }

    repo.remove_stale_edges(link.id, crawl_started_at).await?;
    tracing::info!(
        link_id = %link.id,
        url = %link.url,
        discovered = targets.len(),
        "crawl_recorded"
    );
    Ok(CrawlSummary {
        link,
        discovered: targets.len(),
    })
}
