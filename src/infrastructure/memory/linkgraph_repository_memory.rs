use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::ports::linkgraph_repository::{
    EdgeIterator, GraphError, LinkGraphRepository, LinkIterator,
};
use crate::domain::graph::{Edge, Link};
use crate::infrastructure::memory::SnapshotIterator;

#[derive(Debug, Default)]
pub(crate) struct GraphState {
    pub(crate) links: HashMap<Uuid, Link>,
    pub(crate) edges: HashMap<Uuid, Edge>,
    link_url_index: HashMap<String, Uuid>,
    // edge ids grouped by source link
    link_edge_map: HashMap<Uuid, Vec<Uuid>>,
}

impl GraphState {
    fn fresh_link_id(&self) -> Uuid {
        loop {
            let id = Uuid::new_v4();
            if !self.links.contains_key(&id) {
                return id;
            }
        }
    }

    fn fresh_edge_id(&self) -> Uuid {
        loop {
            let id = Uuid::new_v4();
            if !self.edges.contains_key(&id) {
                return id;
            }
        }
    }

    fn edge_between(&self, src: Uuid, dst: Uuid) -> Option<Uuid> {
        self.link_edge_map.get(&src).and_then(|ids| {
            ids.iter()
                .copied()
                .find(|id| self.edges.get(id).is_some_and(|e| e.dst == dst))
        })
    }
}

/// Link graph kept entirely in process memory. All index structures sit
/// behind a single reader/writer lock; every value handed out is a clone.
#[derive(Clone, Default)]
pub struct InMemoryLinkGraphRepository {
    state: Arc<RwLock<GraphState>>,
}

impl InMemoryLinkGraphRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkGraphRepository for InMemoryLinkGraphRepository {
    async fn upsert_link(&self, link: &mut Link) -> Result<(), GraphError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        // A known URL turns the insert into an update of the existing link.
        if let Some(&id) = state.link_url_index.get(&link.url) {
            if let Some(existing) = state.links.get_mut(&id) {
                let retrieved_at = existing.retrieved_at.max(link.retrieved_at);
                link.id = id;
                link.retrieved_at = retrieved_at;
                *existing = link.clone();
                return Ok(());
            }
        }

        link.id = state.fresh_link_id();
        state.link_url_index.insert(link.url.clone(), link.id);
        state.links.insert(link.id, link.clone());
        tracing::debug!(link_id = %link.id, url = %link.url, "link_inserted");
        Ok(())
    }

    async fn find_link(&self, id: Uuid) -> Result<Link, GraphError> {
        let state = self.state.read().await;
        state.links.get(&id).cloned().ok_or(GraphError::NotFound)
    }

    async fn upsert_edge(&self, edge: &mut Edge) -> Result<(), GraphError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if let Some(id) = state.edge_between(edge.src, edge.dst) {
            if let Some(existing) = state.edges.get_mut(&id) {
                existing.updated_at = Utc::now();
                *edge = existing.clone();
                return Ok(());
            }
        }

        if !state.links.contains_key(&edge.src) || !state.links.contains_key(&edge.dst) {
            return Err(GraphError::UnknownEdgeEndpoints);
        }

        edge.id = state.fresh_edge_id();
        edge.updated_at = Utc::now();
        state.edges.insert(edge.id, edge.clone());
        state.link_edge_map.entry(edge.src).or_default().push(edge.id);
        Ok(())
    }

    async fn remove_stale_edges(
        &self,
        from_id: Uuid,
        updated_before: DateTime<Utc>,
    ) -> Result<(), GraphError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let Some(edge_ids) = state.link_edge_map.get_mut(&from_id) else {
            return Ok(());
        };
        let edges = &mut state.edges;
        let before = edge_ids.len();
        edge_ids.retain(|id| {
            let stale = edges.get(id).is_none_or(|e| e.updated_at < updated_before);
            if stale {
                edges.remove(id);
            }
            !stale
        });
        tracing::debug!(
            link_id = %from_id,
            removed = before - edge_ids.len(),
            "stale_edges_removed"
        );
        Ok(())
    }

    async fn links(
        &self,
        from_id: Uuid,
        to_id: Uuid,
        retrieved_before: DateTime<Utc>,
    ) -> Result<Box<dyn LinkIterator>, GraphError> {
        let state = self.state.read().await;
        let ids = state
            .links
            .values()
            .filter(|l| l.id >= from_id && l.id < to_id && l.retrieved_before(retrieved_before))
            .map(|l| l.id)
            .collect();
        Ok(Box::new(SnapshotIterator::links(self.state.clone(), ids)))
    }

    async fn edges(
        &self,
        from_id: Uuid,
        to_id: Uuid,
        updated_before: DateTime<Utc>,
    ) -> Result<Box<dyn EdgeIterator>, GraphError> {
        let state = self.state.read().await;
        let ids = state
            .link_edge_map
            .iter()
            .filter(|(src, _)| **src >= from_id && **src < to_id)
            .flat_map(|(_, edge_ids)| edge_ids.iter())
            .filter(|id| {
                state
                    .edges
                    .get(*id)
                    .is_some_and(|e| e.updated_at < updated_before)
            })
            .copied()
            .collect();
        Ok(Box::new(SnapshotIterator::edges(self.state.clone(), ids)))
    }
}
