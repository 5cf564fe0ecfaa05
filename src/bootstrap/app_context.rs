use std::sync::Arc;

use anyhow::Context;

use crate::application::ports::linkgraph_repository::LinkGraphRepository;
use crate::application::ports::text_indexer::TextIndexer;
use crate::bootstrap::config::{Backend, Config};
use crate::infrastructure::db::repositories::linkgraph_repository_sqlx::SqlxLinkGraphRepository;
use crate::infrastructure::db::repositories::text_indexer_sqlx::SqlxTextIndexer;
use crate::infrastructure::db::{self, PgPool};
use crate::infrastructure::memory::InMemoryLinkGraphRepository;
use crate::infrastructure::search::InMemoryTextIndexer;

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

pub struct AppServices {
    linkgraph_repo: Arc<dyn LinkGraphRepository>,
    text_indexer: Arc<dyn TextIndexer>,
    pool: Option<PgPool>,
}

impl AppServices {
    pub fn new(
        linkgraph_repo: Arc<dyn LinkGraphRepository>,
        text_indexer: Arc<dyn TextIndexer>,
        pool: Option<PgPool>,
    ) -> Self {
        Self {
            linkgraph_repo,
            text_indexer,
            pool,
        }
    }

    /// Builds the backends selected by `cfg`, connecting to and migrating
    /// Postgres only when one of them needs it.
    pub async fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let pool = match (cfg.uses_postgres(), cfg.database_url.as_deref()) {
            (true, Some(url)) => {
                let pool = db::connect_pool(url, cfg.db_max_connections)
                    .await
                    .context("connect to postgres")?;
                db::migrate(&pool).await.context("run migrations")?;
                Some(pool)
            }
            (true, None) => anyhow::bail!("DATABASE_URL is required for postgres backends"),
            (false, _) => None,
        };

        let linkgraph_repo: Arc<dyn LinkGraphRepository> = match (cfg.graph_backend, &pool) {
            (Backend::Postgres, Some(pool)) => Arc::new(SqlxLinkGraphRepository::new(pool.clone())),
            _ => Arc::new(InMemoryLinkGraphRepository::new()),
        };
        let text_indexer: Arc<dyn TextIndexer> = match (cfg.index_backend, &pool) {
            (Backend::Postgres, Some(pool)) => Arc::new(SqlxTextIndexer::new(pool.clone())),
            _ => Arc::new(InMemoryTextIndexer::new().context("create in-memory text index")?),
        };
        tracing::info!(
            graph = ?cfg.graph_backend,
            index = ?cfg.index_backend,
            "backends_ready"
        );

        Ok(Self::new(linkgraph_repo, text_indexer, pool))
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn linkgraph_repo(&self) -> Arc<dyn LinkGraphRepository> {
        self.services.linkgraph_repo.clone()
    }

    pub fn text_indexer(&self) -> Arc<dyn TextIndexer> {
        self.services.text_indexer.clone()
    }

    pub fn pool(&self) -> Option<PgPool> {
        self.services.pool.clone()
    }
}
