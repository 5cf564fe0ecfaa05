use axum::http::StatusCode;

use crate::application::ports::linkgraph_repository::GraphError;
use crate::application::ports::text_indexer::IndexError;

pub mod documents;
pub mod health;
pub mod links;

/// Maps a use-case failure onto a response status, logging server errors.
pub(crate) fn error_status(err: anyhow::Error) -> StatusCode {
    let status = if let Some(e) = err.downcast_ref::<GraphError>() {
        match e {
            GraphError::NotFound => StatusCode::NOT_FOUND,
            GraphError::UnknownEdgeEndpoints => StatusCode::UNPROCESSABLE_ENTITY,
            GraphError::Backend { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    } else if let Some(e) = err.downcast_ref::<IndexError>() {
        match e {
            IndexError::NotFound => StatusCode::NOT_FOUND,
            IndexError::MissingLinkId | IndexError::InvalidScore => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            IndexError::Backend { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    if status.is_server_error() {
        tracing::error!(error = ?err, "request_failed");
    }
    status
}
