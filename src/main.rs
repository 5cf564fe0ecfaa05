use std::net::SocketAddr;

use axum::extract::MatchedPath;
use axum::{Json, Router, routing::get};
use dotenvy::dotenv;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;

use linkstore::bootstrap::app_context::{AppContext, AppServices};
use linkstore::bootstrap::config::Config;

#[derive(OpenApi)]
#[openapi(
        paths(
            linkstore::presentation::http::health::health,
            linkstore::presentation::http::links::upsert_link,
            linkstore::presentation::http::links::get_link,
            linkstore::presentation::http::links::record_crawl,
            linkstore::presentation::http::documents::index_document,
            linkstore::presentation::http::documents::get_document,
            linkstore::presentation::http::documents::update_score,
            linkstore::presentation::http::documents::search_documents,
        ),
        components(schemas(
            linkstore::presentation::http::health::HealthResp,
            linkstore::presentation::http::links::LinkResponse,
            linkstore::presentation::http::links::UpsertLinkRequest,
            linkstore::presentation::http::links::RecordCrawlRequest,
            linkstore::presentation::http::links::RecordCrawlResponse,
            linkstore::presentation::http::documents::Document,
            linkstore::presentation::http::documents::IndexDocumentRequest,
            linkstore::presentation::http::documents::UpdateScoreRequest,
            linkstore::presentation::http::documents::SearchResponse,
        )),
        tags(
            (name = "Links", description = "Link graph and crawl recording"),
            (name = "Documents", description = "Document index and search"),
            (name = "Health", description = "System health checks")
        )
    )]
struct ApiDoc;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = ?e, "shutdown_signal_unavailable");
        std::future::pending::<()>().await;
    }
    info!("shutdown_requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "linkstore=debug,tower_http=info,axum=info".into()),
        )
        .init();

    let cfg = Config::from_env()?;
    info!(?cfg, "Starting link store");

    let services = AppServices::from_config(&cfg).await?;
    let ctx = AppContext::new(cfg.clone(), services);

    let app = Router::new()
        .nest("/api", linkstore::presentation::http::health::routes(ctx.clone()))
        .nest("/api", linkstore::presentation::http::links::routes(ctx.clone()))
        .nest("/api", linkstore::presentation::http::documents::routes(ctx.clone()))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                let matched = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                tracing::info_span!("http", %method, %uri, matched_path = %matched)
            }),
        );

    let api_addr = SocketAddr::from(([0, 0, 0, 0], cfg.api_port));
    info!(%api_addr, "HTTP API listening");
    let listener = tokio::net::TcpListener::bind(api_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = ctx.pool() {
        pool.close().await;
    }
    Ok(())
}
