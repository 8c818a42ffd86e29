use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Errors raised by the graph and its collaborators.
#[derive(Debug, Error)]
pub enum RagError {
    /// A retrieval, search or model call failed. Never retried by the graph.
    #[error("{service} failed: {message}")]
    Collaborator { service: String, message: String },
    /// A judging collaborator answered outside its `yes`/`no` contract.
    #[error("malformed judgment from {grader}: {detail}")]
    MalformedJudgment { grader: String, detail: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl RagError {
    pub fn collaborator<E: std::fmt::Display>(service: impl Into<String>, err: E) -> Self {
        RagError::Collaborator {
            service: service.into(),
            message: err.to_string(),
        }
    }

    pub fn malformed(grader: impl Into<String>, detail: impl Into<String>) -> Self {
        RagError::MalformedJudgment {
            grader: grader.into(),
            detail: detail.into(),
        }
    }

    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        RagError::Internal(err.to_string())
    }

    pub fn is_malformed_judgment(&self) -> bool {
        matches!(self, RagError::MalformedJudgment { .. })
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("upstream failure: {0}")]
    BadGateway(String),
    #[error("service unavailable")]
    #[allow(dead_code)]
    ServiceUnavailable,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::InvalidInput(msg) => ApiError::BadRequest(msg),
            RagError::Collaborator { .. } | RagError::MalformedJudgment { .. } => {
                ApiError::BadGateway(err.to_string())
            }
            RagError::Config(_) | RagError::Internal(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            ApiError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service unavailable".to_string(),
            ),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
