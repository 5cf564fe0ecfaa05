use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::ports::linkgraph_repository::{EdgeIterator, GraphError, LinkIterator};
use crate::domain::graph::{Edge, Link};
use crate::infrastructure::memory::linkgraph_repository_memory::GraphState;

type Lookup<T> = fn(&GraphState, &Uuid) -> Option<T>;

/// Iterates a set of ids captured when the iterator was created. The record
/// behind each id is cloned under the read lock at the moment it is reached,
/// so a concurrent upsert never tears a yielded value; records removed in the
/// meantime are skipped.
pub struct SnapshotIterator<T> {
    state: Option<Arc<RwLock<GraphState>>>,
    ids: std::vec::IntoIter<Uuid>,
    lookup: Lookup<T>,
    current: T,
}

impl<T: Default> SnapshotIterator<T> {
    fn new(state: Arc<RwLock<GraphState>>, ids: Vec<Uuid>, lookup: Lookup<T>) -> Self {
        Self {
            state: Some(state),
            ids: ids.into_iter(),
            lookup,
            current: T::default(),
        }
    }

    async fn advance(&mut self) -> bool {
        let Some(state) = self.state.as_ref() else {
            return false;
        };
        let state = state.read().await;
        for id in self.ids.by_ref() {
            if let Some(item) = (self.lookup)(&state, &id) {
                self.current = item;
                return true;
            }
        }
        false
    }

    fn release(&mut self) {
        self.state = None;
        self.ids = Vec::new().into_iter();
    }
}

impl SnapshotIterator<Link> {
    pub(crate) fn links(state: Arc<RwLock<GraphState>>, ids: Vec<Uuid>) -> Self {
        Self::new(state, ids, |s, id| s.links.get(id).cloned())
    }
}

impl SnapshotIterator<Edge> {
    pub(crate) fn edges(state: Arc<RwLock<GraphState>>, ids: Vec<Uuid>) -> Self {
        Self::new(state, ids, |s, id| s.edges.get(id).cloned())
    }
}

#[async_trait]
impl LinkIterator for SnapshotIterator<Link> {
    async fn next(&mut self) -> bool {
        self.advance().await
    }

    fn link(&self) -> &Link {
        &self.current
    }

    fn error(&self) -> Option<&GraphError> {
        None
    }

    async fn close(&mut self) -> Result<(), GraphError> {
        self.release();
        Ok(())
    }
}

#[async_trait]
impl EdgeIterator for SnapshotIterator<Edge> {
    async fn next(&mut self) -> bool {
        self.advance().await
    }

    fn edge(&self) -> &Edge {
        &self.current
    }

    fn error(&self) -> Option<&GraphError> {
        None
    }

    async fn close(&mut self) -> Result<(), GraphError> {
        self.release();
        Ok(())
    }
}
