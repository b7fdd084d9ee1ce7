use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ExecutorError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ExecutorError> for node_types::CoreError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::BadRequest(m) => node_types::CoreError::Validation(m),
            ExecutorError::Unauthorized(m) => node_types::CoreError::Unauthorized(m),
            ExecutorError::NotFound(m) => node_types::CoreError::NotFound(m),
            ExecutorError::ServiceUnavailable(m) => node_types::CoreError::TransientRemote(m),
        }
    }
}

impl From<node_types::CoreError> for ExecutorError {
    fn from(err: node_types::CoreError) -> Self {
        match err {
            node_types::CoreError::NotFound(m) => ExecutorError::NotFound(m),
            node_types::CoreError::Validation(m) => ExecutorError::BadRequest(m),
            node_types::CoreError::Unauthorized(m) => ExecutorError::Unauthorized(m),
            other => ExecutorError::ServiceUnavailable(other.to_string()),
        }
    }
}

impl IntoResponse for ExecutorError {
    fn into_response(self) -> Response {
        let status = match &self {
            ExecutorError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ExecutorError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ExecutorError::NotFound(_) => StatusCode::NOT_FOUND,
            ExecutorError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
