use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use crate::application::ports::text_indexer::{
    DocumentIterator, IndexError, SearchPage, SearchPageSource, TextIndexer,
};
use crate::application::search::PagedDocumentIterator;
use crate::domain::documents::document::{Document, DocumentQuery, QueryType};
use crate::infrastructure::db::PgPool;

type DocumentRow = (Uuid, String, String, String, Option<DateTime<Utc>>, f64);

fn into_document(row: DocumentRow) -> Document {
    let (link_id, url, title, content, indexed_at, page_rank) = row;
    Document {
        link_id,
        url,
        title,
        content,
        indexed_at,
        page_rank,
    }
}

// Any of the lexemes, each quoted so punctuation in them is not parsed as an operator
const MATCH_TSQUERY: &str = "to_tsquery('simple', array_to_string(ARRAY(\
    SELECT quote_literal(lexeme) FROM unnest(tsvector_to_array(to_tsvector('simple', $1))) AS lexeme\
    ), ' | '))";
const PHRASE_TSQUERY: &str = "phraseto_tsquery('simple', $1)";

fn tsquery_for(query_type: QueryType) -> &'static str {
    match query_type {
        QueryType::Match => MATCH_TSQUERY,
        QueryType::Phrase => PHRASE_TSQUERY,
    }
}

pub struct SqlxTextIndexer {
    pub pool: PgPool,
}

impl SqlxTextIndexer {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TextIndexer for SqlxTextIndexer {
    async fn index(&self, doc: &mut Document) -> Result<(), IndexError> {
        if doc.link_id.is_nil() {
            return Err(IndexError::MissingLinkId);
        }
        if !doc.page_rank.is_finite() {
            return Err(IndexError::InvalidScore);
        }
        let indexed_at = Utc::now().trunc_subsecs(6);

        // page_rank is only written for new rows
        sqlx::query(
            r#"INSERT INTO documents (link_id, url, title, content, indexed_at, page_rank)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (link_id) DO UPDATE
               SET url = EXCLUDED.url,
                   title = EXCLUDED.title,
                   content = EXCLUDED.content,
                   indexed_at = EXCLUDED.indexed_at"#,
        )
        .bind(doc.link_id)
        .bind(&doc.url)
        .bind(&doc.title)
        .bind(&doc.content)
        .bind(indexed_at)
        .bind(doc.page_rank)
        .execute(&self.pool)
        .await
        .map_err(|e| IndexError::backend("index", e))?;

        doc.indexed_at = Some(indexed_at);
        tracing::debug!(link_id = %doc.link_id, "document_indexed");
        Ok(())
    }

    async fn find_by_id(&self, link_id: Uuid) -> Result<Document, IndexError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"SELECT link_id, url, title, content, indexed_at, page_rank
               FROM documents WHERE link_id = $1"#,
        )
        .bind(link_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IndexError::backend("find by id", e))?;
        row.map(into_document).ok_or(IndexError::NotFound)
    }

    async fn update_score(&self, link_id: Uuid, score: f64) -> Result<(), IndexError> {
        if !score.is_finite() {
            return Err(IndexError::InvalidScore);
        }
        sqlx::query(
            r#"INSERT INTO documents (link_id, page_rank) VALUES ($1, $2)
               ON CONFLICT (link_id) DO UPDATE SET page_rank = EXCLUDED.page_rank"#,
        )
        .bind(link_id)
        .bind(score)
        .execute(&self.pool)
        .await
        .map_err(|e| IndexError::backend("update score", e))?;
        Ok(())
    }

    async fn search(&self, query: &DocumentQuery) -> Result<Box<dyn DocumentIterator>, IndexError> {
        let source = Arc::new(Self::new(self.pool.clone()));
        let it = PagedDocumentIterator::start(source, query.clone()).await?;
        Ok(Box::new(it))
    }
}

#[async_trait]
impl SearchPageSource for SqlxTextIndexer {
    async fn fetch_page(
        &self,
        query: &DocumentQuery,
        from: u64,
        size: usize,
    ) -> Result<SearchPage, IndexError> {
        let tsquery = tsquery_for(query.query_type);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM documents WHERE search_vector @@ {tsquery}"
        ))
        .bind(&query.expression)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| IndexError::backend("search", e))?;

        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"SELECT d.link_id, d.url, d.title, d.content, d.indexed_at, d.page_rank
               FROM documents d, {tsquery} AS q
               WHERE d.search_vector @@ q
               ORDER BY d.page_rank DESC, ts_rank(d.search_vector, q) DESC, d.link_id
               LIMIT $2 OFFSET $3"#
        ))
        .bind(&query.expression)
        .bind(size as i64)
        .bind(i64::try_from(from).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| IndexError::backend("search", e))?;

        Ok(SearchPage {
            total: total.max(0) as u64,
            documents: rows.into_iter().map(into_document).collect(),
        })
    }
}
