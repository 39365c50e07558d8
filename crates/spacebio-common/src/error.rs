use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpaceBioError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Paper not found: {0}")]
    PaperNotFound(String),

    #[error("Invalid paper: {0}")]
    InvalidPaper(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SpaceBioError>;

/// Error returned by HTTP handlers. Renders as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_)   => StatusCode::NOT_FOUND,
            ApiError::Conflict(_)   => StatusCode::CONFLICT,
            ApiError::Upstream(_)   => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_)   => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wrap any displayable error as an internal server error.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<SpaceBioError> for ApiError {
    fn from(err: SpaceBioError) -> Self {
        match err {
            SpaceBioError::PaperNotFound(id) => ApiError::NotFound(format!("Paper not found: {id}")),
            SpaceBioError::InvalidPaper(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
