use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A crawled web resource. `url` is the natural key; `id` is assigned by the
/// graph store on first upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: Uuid,
    pub url: String,
    // None until the page has been fetched at least once
    pub retrieved_at: Option<DateTime<Utc>>,
}

impl Link {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::nil(),
            url: url.into(),
            retrieved_at: None,
        }
    }

    pub fn retrieved(url: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            retrieved_at: Some(at),
            ..Self::new(url)
        }
    }

    pub fn retrieved_before(&self, bound: DateTime<Utc>) -> bool {
        self.retrieved_at.is_none_or(|at| at < bound)
    }
}
