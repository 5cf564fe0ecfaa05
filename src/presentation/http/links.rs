use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::linkgraph::CrawledPage;
use crate::application::use_cases::links::get_link::GetLink;
use crate::application::use_cases::links::record_crawl::RecordCrawl;
use crate::application::use_cases::links::upsert_link::UpsertLink;
use crate::bootstrap::app_context::AppContext;
use crate::domain::graph::Link;
use crate::presentation::http::error_status;

#[derive(Debug, Serialize, ToSchema)]
pub struct LinkResponse {
    pub id: Uuid,
    pub url: String,
    pub retrieved_at: Option<DateTime<Utc>>,
}

impl From<Link> for LinkResponse {
    fn from(l: Link) -> Self {
        Self {
            id: l.id,
            url: l.url,
            retrieved_at: l.retrieved_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertLinkRequest {
    pub url: String,
    pub retrieved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordCrawlRequest {
    pub url: String,
    /// Defaults to the time the request is handled.
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub outgoing: Vec<String>,
    /// Edges of the page older than this are dropped; defaults to now.
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordCrawlResponse {
    pub link: LinkResponse,
    pub discovered: usize,
}

#[utoipa::path(post, path = "/api/links", tag = "Links",
    request_body = UpsertLinkRequest,
    responses((status = 200, body = LinkResponse), (status = 422)))]
pub async fn upsert_link(
    State(ctx): State<AppContext>,
    Json(req): Json<UpsertLinkRequest>,
) -> Result<Json<LinkResponse>, StatusCode> {
    if req.url.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let repo = ctx.linkgraph_repo();
    let uc = UpsertLink {
        repo: repo.as_ref(),
    };
    let link = uc
        .execute(&req.url, req.retrieved_at)
        .await
        .map_err(error_status)?;
    Ok(Json(link.into()))
}

#[utoipa::path(get, path = "/api/links/{id}", tag = "Links",
    params(("id" = Uuid, Path, description = "Link id")),
    responses((status = 200, body = LinkResponse), (status = 404)))]
pub async fn get_link(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<LinkResponse>, StatusCode> {
    let repo = ctx.linkgraph_repo();
    let uc = GetLink {
        repo: repo.as_ref(),
    };
    match uc.execute(id).await.map_err(error_status)? {
        Some(link) => Ok(Json(link.into())),
        None => Err(StatusCode::NOT_FOUND),
    }
}

#[utoipa::path(post, path = "/api/crawls", tag = "Links",
    request_body = RecordCrawlRequest,
    responses((status = 200, body = RecordCrawlResponse), (status = 422)))]
pub async fn record_crawl(
    State(ctx): State<AppContext>,
    Json(req): Json<RecordCrawlRequest>,
) -> Result<Json<RecordCrawlResponse>, StatusCode> {
    if req.url.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let page = CrawledPage {
        url: req.url,
        fetched_at: req.fetched_at.unwrap_or_else(Utc::now),
        outgoing: req.outgoing,
    };
    let repo = ctx.linkgraph_repo();
    let uc = RecordCrawl {
        repo: repo.as_ref(),
    };
    let summary = uc
        .execute(&page, req.started_at)
        .await
        .map_err(error_status)?;
    Ok(Json(RecordCrawlResponse {
        link: summary.link.into(),
        discovered: summary.discovered,
    }))
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/links", post(upsert_link))
        .route("/links/:id", get(get_link))
        .route("/crawls", post(record_crawl))
        .with_state(ctx)
}
