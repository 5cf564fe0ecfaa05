use std::env;
use std::str::FromStr;

/// Storage backend for one of the two stores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    #[default]
    Memory,
    Postgres,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "memory" | "mem" => Ok(Backend::Memory),
            "postgres" | "postgresql" | "pg" => Ok(Backend::Postgres),
            other => anyhow::bail!("unknown backend {other:?} (expected memory or postgres)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_port: u16,
    pub database_url: Option<String>,
    pub graph_backend: Backend,
    pub index_backend: Backend,
    pub db_max_connections: u32,
    pub search_max_limit: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let api_port = lookup("API_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(8890);
        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());
        let graph_backend = lookup("GRAPH_BACKEND")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or_default();
        let index_backend = lookup("INDEX_BACKEND")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or_default();
        let db_max_connections = lookup("DB_MAX_CONNECTIONS")
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(10);
        let search_max_limit = lookup("SEARCH_MAX_LIMIT")
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(100);

        let cfg = Self {
            api_port,
            database_url,
            graph_backend,
            index_backend,
            db_max_connections,
            search_max_limit,
        };
        if cfg.uses_postgres() && cfg.database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when a postgres backend is selected");
        }
        Ok(cfg)
    }

    pub fn uses_postgres(&self) -> bool {
        self.graph_backend == Backend::Postgres || self.index_backend == Backend::Postgres
    }
}
