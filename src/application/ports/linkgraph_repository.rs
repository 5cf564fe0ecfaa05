use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::graph::{Edge, Link};

#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    #[error("not found")]
    NotFound,
    #[error("unknown source and/or destination for edge")]
    UnknownEdgeEndpoints,
    #[error("{op}: backend failure")]
    Backend {
        op: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl GraphError {
    pub fn backend(op: &'static str, source: impl Into<anyhow::Error>) -> Self {
        GraphError::Backend {
            op,
            source: source.into(),
        }
    }
}

#[async_trait]
pub trait LinkGraphRepository: Send + Sync {
    /// Inserts `link` or, when its URL is already known, updates the stored
    /// link in place. The assigned id and the resulting `retrieved_at` are
    /// written back into `link`.
    async fn upsert_link(&self, link: &mut Link) -> Result<(), GraphError>;

    async fn find_link(&self, id: Uuid) -> Result<Link, GraphError>;

    /// Inserts `edge` or refreshes the `updated_at` of the edge already
    /// connecting the same `(src, dst)` pair. On return `edge` holds the
    /// stored state, including its stable id.
    async fn upsert_edge(&self, edge: &mut Edge) -> Result<(), GraphError>;

    async fn remove_stale_edges(
        &self,
        from_id: Uuid,
        updated_before: DateTime<Utc>,
    ) -> Result<(), GraphError>;

    /// Links with `id` in `[from_id, to_id)` retrieved before `retrieved_before`.
    async fn links(
        &self,
        from_id: Uuid,
        to_id: Uuid,
        retrieved_before: DateTime<Utc>,
    ) -> Result<Box<dyn LinkIterator>, GraphError>;

    /// Edges whose `src` is in `[from_id, to_id)` updated before `updated_before`.
    async fn edges(
        &self,
        from_id: Uuid,
        to_id: Uuid,
        updated_before: DateTime<Utc>,
    ) -> Result<Box<dyn EdgeIterator>, GraphError>;
}

// Forward-only cursors. `next` returns false for good once the results are
// exhausted, the iterator is closed or a fault occurred; `error` tells the
// last two apart.
#[async_trait]
pub trait LinkIterator: Send {
    async fn next(&mut self) -> bool;
    fn link(&self) -> &Link;
    fn error(&self) -> Option<&GraphError>;
    async fn close(&mut self) -> Result<(), GraphError>;
}

#[async_trait]
pub trait EdgeIterator: Send {
    async fn next(&mut self) -> bool;
    fn edge(&self) -> &Edge;
    fn error(&self) -> Option<&GraphError>;
    async fn close(&mut self) -> Result<(), GraphError>;
}
