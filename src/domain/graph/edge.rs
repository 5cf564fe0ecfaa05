use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A directed hyperlink observed on `src` pointing at `dst`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: Uuid,
    pub src: Uuid,
    pub dst: Uuid,
    pub updated_at: DateTime<Utc>,
}

impl Edge {
    pub fn new(src: Uuid, dst: Uuid) -> Self {
        Self {
            src,
            dst,
            ..Self::default()
        }
    }
}
