// Module layout (Clean Architecture style)
// - bootstrap: configuration and backend composition
// - infrastructure: in-memory, Postgres and tantivy adapters
// - presentation: HTTP handlers and routing
// - application: ports, crawl recording, search paging and use cases
// - domain: links, edges, documents and id-space partitioning

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
