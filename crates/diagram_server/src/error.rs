use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diagram::DiagramError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Upload storage failures
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned to HTTP clients as `{"error": message}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidFileType(_) => ApiError::BadRequest(err.to_string()),
            StorageError::Io(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<DiagramError> for ApiError {
    fn from(err: DiagramError) -> Self {
        match err {
            DiagramError::Decode { .. } | DiagramError::DecodeBytes(_) => {
                ApiError::BadRequest(err.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        } else {
            warn!(%status, error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
