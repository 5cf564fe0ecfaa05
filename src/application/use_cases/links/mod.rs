pub mod get_link;
pub mod record_crawl;
pub mod upsert_link;
