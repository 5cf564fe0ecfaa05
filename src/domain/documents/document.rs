use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Searchable representation of a link's content.
///
/// `page_rank` belongs to the ranking pipeline: re-indexing content never
/// changes it, only a score update does.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub link_id: Uuid,
    pub url: String,
    pub title: String,
    pub content: String,
    // None for placeholders created by a score update
    pub indexed_at: Option<DateTime<Utc>>,
    pub page_rank: f64,
}

impl Document {
    pub fn placeholder(link_id: Uuid, page_rank: f64) -> Self {
        Self {
            link_id,
            page_rank,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// Documents containing any of the terms, in any order.
    #[default]
    Match,
    /// Documents containing the exact ordered phrase.
    Phrase,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    pub query_type: QueryType,
    pub expression: String,
    pub offset: u64,
}

impl DocumentQuery {
    pub fn matching(expression: impl Into<String>) -> Self {
        Self {
            query_type: QueryType::Match,
            expression: expression.into(),
            offset: 0,
        }
    }

    pub fn phrase(expression: impl Into<String>) -> Self {
        Self {
            query_type: QueryType::Phrase,
            expression: expression.into(),
            offset: 0,
        }
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }
}
