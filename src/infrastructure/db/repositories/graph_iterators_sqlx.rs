use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::application::ports::linkgraph_repository::{EdgeIterator, GraphError, LinkIterator};
use crate::domain::graph::{Edge, Link};
use crate::infrastructure::db::PgPool;

pub(crate) const BATCH_SIZE: i64 = 128;

/// Row type that can be paged through by ascending id.
#[async_trait]
pub(crate) trait KeysetRecord: Default + Send + Sized + 'static {
    const OP: &'static str;

    fn key(&self) -> Uuid;

    /// Up to `limit` rows inside the half-open `range` whose key is at
    /// least `cursor` and that pass the time filter, ordered by key.
    async fn fetch(
        pool: &PgPool,
        range: (Uuid, Uuid),
        cursor: Uuid,
        before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error>;
}

#[async_trait]
impl KeysetRecord for Link {
    const OP: &'static str = "iterate links";

    fn key(&self) -> Uuid {
        self.id
    }

    async fn fetch(
        pool: &PgPool,
        range: (Uuid, Uuid),
        cursor: Uuid,
        before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (Uuid, String, Option<DateTime<Utc>>)>(
            r#"SELECT id, url, retrieved_at FROM links
               WHERE id >= $1 AND id < $2 AND id >= $3
                 AND (retrieved_at IS NULL OR retrieved_at < $4)
               ORDER BY id LIMIT $5"#,
        )
        .bind(range.0)
        .bind(range.1)
        .bind(cursor)
        .bind(before)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, url, retrieved_at)| Link {
                id,
                url,
                retrieved_at,
            })
            .collect())
    }
}

#[async_trait]
impl KeysetRecord for Edge {
    const OP: &'static str = "iterate edges";

    fn key(&self) -> Uuid {
        self.id
    }

    // Partitioned by source link, paged by edge id
    async fn fetch(
        pool: &PgPool,
        range: (Uuid, Uuid),
        cursor: Uuid,
        before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid, Uuid, DateTime<Utc>)>(
            r#"SELECT id, src, dst, updated_at FROM edges
               WHERE src >= $1 AND src < $2 AND id >= $3 AND updated_at < $4
               ORDER BY id LIMIT $5"#,
        )
        .bind(range.0)
        .bind(range.1)
        .bind(cursor)
        .bind(before)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, src, dst, updated_at)| Edge {
                id,
                src,
                dst,
                updated_at,
            })
            .collect())
    }
}

/// Streams rows from Postgres in id-ordered batches. A failed batch fetch is
/// recorded and ends the iteration.
pub(crate) struct KeysetIterator<T: KeysetRecord> {
    pool: Option<PgPool>,
    range: (Uuid, Uuid),
    before: DateTime<Utc>,
    // lower bound of the next batch; None once the range is exhausted
    next_key: Option<Uuid>,
    buffer: VecDeque<T>,
    current: T,
    last_err: Option<GraphError>,
}

impl<T: KeysetRecord> KeysetIterator<T> {
    /// Fetches the first batch eagerly so query errors surface to the caller.
    pub(crate) async fn start(
        pool: PgPool,
        from: Uuid,
        to: Uuid,
        before: DateTime<Utc>,
    ) -> Result<Self, GraphError> {
        let mut it = Self {
            pool: Some(pool),
            range: (from, to),
            before,
            next_key: Some(Uuid::nil()),
            buffer: VecDeque::new(),
            current: T::default(),
            last_err: None,
        };
        it.fill().await;
        match it.last_err.take() {
            Some(e) => Err(e),
            None => Ok(it),
        }
    }

    async fn fill(&mut self) -> bool {
        let (Some(pool), Some(cursor)) = (self.pool.as_ref(), self.next_key) else {
            return false;
        };
        match T::fetch(pool, self.range, cursor, self.before, BATCH_SIZE).await {
            Ok(rows) => {
                self.next_key = if (rows.len() as i64) < BATCH_SIZE {
                    None
                } else {
                    rows.last()
                        .and_then(|r| r.key().as_u128().checked_add(1))
                        .map(Uuid::from_u128)
                };
                self.buffer.extend(rows);
                !self.buffer.is_empty()
            }
            Err(e) => {
                tracing::warn!(error = ?e, op = T::OP, "graph_batch_fetch_failed");
                self.last_err = Some(GraphError::backend(T::OP, e));
                false
            }
        }
    }

    async fn advance(&mut self) -> bool {
        if self.last_err.is_some() {
            return false;
        }
        if self.buffer.is_empty() && !self.fill().await {
            return false;
        }
        match self.buffer.pop_front() {
            Some(item) => {
                self.current = item;
                true
            }
            None => false,
        }
    }

    fn release(&mut self) {
        self.pool = None;
        self.next_key = None;
        self.buffer.clear();
    }
}

#[async_trait]
impl LinkIterator for KeysetIterator<Link> {
    async fn next(&mut self) -> bool {
        self.advance().await
    }

    fn link(&self) -> &Link {
        &self.current
    }

    fn error(&self) -> Option<&GraphError> {
        self.last_err.as_ref()
    }

    async fn close(&mut self) -> Result<(), GraphError> {
        self.release();
        Ok(())
    }
}

#[async_trait]
impl EdgeIterator for KeysetIterator<Edge> {
    async fn next(&mut self) -> bool {
        self.advance().await
    }

    fn edge(&self) -> &Edge {
        &self.current
    }

    fn error(&self) -> Option<&GraphError> {
        self.last_err.as_ref()
    }

    async fn close(&mut self) -> Result<(), GraphError> {
        self.release();
        Ok(())
    }
}
