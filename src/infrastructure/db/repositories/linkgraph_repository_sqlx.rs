use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::application::ports::linkgraph_repository::{
    EdgeIterator, GraphError, LinkGraphRepository, LinkIterator,
};
use crate::domain::graph::{Edge, Link};
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::repositories::graph_iterators_sqlx::KeysetIterator;

pub struct SqlxLinkGraphRepository {
    pub pool: PgPool,
}

impl SqlxLinkGraphRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkGraphRepository for SqlxLinkGraphRepository {
    async fn upsert_link(&self, link: &mut Link) -> Result<(), GraphError> {
        // GREATEST skips NULLs, so a never-fetched row adopts the first timestamp
        let (id, retrieved_at) = sqlx::query_as::<_, (Uuid, Option<DateTime<Utc>>)>(
            r#"INSERT INTO links (url, retrieved_at) VALUES ($1, $2)
               ON CONFLICT (url) DO UPDATE
               SET retrieved_at = GREATEST(links.retrieved_at, EXCLUDED.retrieved_at)
               RETURNING id, retrieved_at"#,
        )
        .bind(&link.url)
        .bind(link.retrieved_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| GraphError::backend("upsert link", e))?;

        link.id = id;
        link.retrieved_at = retrieved_at;
        Ok(())
    }

    async fn find_link(&self, id: Uuid) -> Result<Link, GraphError> {
        let row = sqlx::query_as::<_, (String, Option<DateTime<Utc>>)>(
            "SELECT url, retrieved_at FROM links WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GraphError::backend("find link", e))?;

        let (url, retrieved_at) = row.ok_or(GraphError::NotFound)?;
        Ok(Link {
            id,
            url,
            retrieved_at,
        })
    }

    async fn upsert_edge(&self, edge: &mut Edge) -> Result<(), GraphError> {
        let (id, updated_at) = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            r#"INSERT INTO edges (src, dst, updated_at) VALUES ($1, $2, $3)
               ON CONFLICT (src, dst) DO UPDATE SET updated_at = EXCLUDED.updated_at
               RETURNING id, updated_at"#,
        )
        .bind(edge.src)
        .bind(edge.dst)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                GraphError::UnknownEdgeEndpoints
            }
            _ => GraphError::backend("upsert edge", e),
        })?;

        edge.id = id;
        edge.updated_at = updated_at;
        Ok(())
    }

    async fn remove_stale_edges(
        &self,
        from_id: Uuid,
        updated_before: DateTime<Utc>,
    ) -> Result<(), GraphError> {
        let res = sqlx::query("DELETE FROM edges WHERE src = $1 AND updated_at < $2")
            .bind(from_id)
            .bind(updated_before)
            .execute(&self.pool)
            .await
            .map_err(|e| GraphError::backend("remove stale edges", e))?;
        tracing::debug!(
            link_id = %from_id,
            removed = res.rows_affected(),
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
        let it =
            KeysetIterator::<Link>::start(self.pool.clone(), from_id, to_id, retrieved_before)
                .await?;
        Ok(Box::new(it))
    }

    async fn edges(
        &self,
        from_id: Uuid,
        to_id: Uuid,
        updated_before: DateTime<Utc>,
    ) -> Result<Box<dyn EdgeIterator>, GraphError> {
        let it = KeysetIterator::<Edge>::start(self.pool.clone(), from_id, to_id, updated_before)
            .await?;
        Ok(Box::new(it))
    }
}
