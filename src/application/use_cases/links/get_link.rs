use uuid::Uuid;

use crate::application::ports::linkgraph_repository::{GraphError, LinkGraphRepository};
use crate::domain::graph::Link;

pub struct GetLink<'a, R: LinkGraphRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: LinkGraphRepository + ?Sized> GetLink<'a, R> {
    pub async fn execute(&self, id: Uuid) -> anyhow::Result<Option<Link>> {
        match self.repo.find_link(id).await {
            Ok(link) => Ok(Some(link)),
            Err(GraphError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
