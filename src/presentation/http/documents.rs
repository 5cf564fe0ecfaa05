use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::use_cases::documents::get_document::GetDocument;
use crate::application::use_cases::documents::index_document::IndexDocument;
use crate::application::use_cases::documents::search_documents::SearchDocuments;
use crate::application::use_cases::documents::update_score::UpdateScore;
use crate::bootstrap::app_context::AppContext;
use crate::domain::documents::document::{self as domain, DocumentQuery, QueryType};
use crate::presentation::http::error_status;

const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Debug, Serialize, ToSchema)]
pub struct Document {
    pub link_id: Uuid,
    pub url: String,
    pub title: String,
    pub content: String,
    pub indexed_at: Option<DateTime<Utc>>,
    pub page_rank: f64,
}

impl From<domain::Document> for Document {
    fn from(d: domain::Document) -> Self {
        Self {
            link_id: d.link_id,
            url: d.url,
            title: d.title,
            content: d.content,
            indexed_at: d.indexed_at,
            page_rank: d.page_rank,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IndexDocumentRequest {
    pub link_id: Uuid,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateScoreRequest {
    pub score: f64,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default)]
    pub mode: QueryType,
    #[serde(default)]
    pub offset: u64,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub total: u64,
    pub offset: u64,
    pub items: Vec<Document>,
}

#[utoipa::path(post, path = "/api/documents", tag = "Documents",
    request_body = IndexDocumentRequest,
    responses((status = 200, body = Document), (status = 422)))]
pub async fn index_document(
    State(ctx): State<AppContext>,
    Json(req): Json<IndexDocumentRequest>,
) -> Result<Json<Document>, StatusCode> {
    let indexer = ctx.text_indexer();
    let uc = IndexDocument {
        indexer: indexer.as_ref(),
    };
    let doc = uc
        .execute(req.link_id, req.url, req.title, req.content)
        .await
        .map_err(error_status)?;
    Ok(Json(doc.into()))
}

#[utoipa::path(get, path = "/api/documents/{id}", tag = "Documents",
    params(("id" = Uuid, Path, description = "Link id of the document")),
    responses((status = 200, body = Document), (status = 404)))]
pub async fn get_document(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Document>, StatusCode> {
    let indexer = ctx.text_indexer();
    let uc = GetDocument {
        indexer: indexer.as_ref(),
    };
    match uc.execute(id).await.map_err(error_status)? {
        Some(doc) => Ok(Json(doc.into())),
        None => Err(StatusCode::NOT_FOUND),
    }
}

#[utoipa::path(put, path = "/api/documents/{id}/score", tag = "Documents",
    params(("id" = Uuid, Path, description = "Link id of the document")),
    request_body = UpdateScoreRequest,
    responses((status = 204), (status = 422)))]
pub async fn update_score(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateScoreRequest>,
) -> Result<StatusCode, StatusCode> {
    if !req.score.is_finite() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let indexer = ctx.text_indexer();
    let uc = UpdateScore {
        indexer: indexer.as_ref(),
    };
    uc.execute(id, req.score).await.map_err(error_status)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/search", tag = "Documents",
    params(
        ("q" = String, Query, description = "Search expression"),
        ("mode" = Option<String>, Query, description = "match (default) or phrase"),
        ("offset" = Option<u64>, Query, description = "Number of results to skip"),
        ("limit" = Option<usize>, Query, description = "Maximum number of results")
    ),
    responses((status = 200, body = SearchResponse)))]
pub async fn search_documents(
    State(ctx): State<AppContext>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, StatusCode> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .min(ctx.cfg.search_max_limit);
    let query = DocumentQuery {
        query_type: params.mode,
        expression: params.q,
        offset: params.offset,
    };

    let indexer = ctx.text_indexer();
    let uc = SearchDocuments {
        indexer: indexer.as_ref(),
    };
    let results = uc.execute(query, limit).await.map_err(error_status)?;
    Ok(Json(SearchResponse {
        total: results.total,
        offset: results.offset,
        items: results.documents.into_iter().map(Document::from).collect(),
    }))
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/documents", post(index_document))
        .route("/documents/:id", get(get_document))
        .route("/documents/:id/score", put(update_score))
        .route("/search", get(search_documents))
        .with_state(ctx)
}
