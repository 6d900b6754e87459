use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde::Serialize;
use tracing::{debug, error};

pub type Error = anyhow::Error; //Box<dyn std::error::Error + Send + Sync + 'static>;
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Resource already exists: {0}")]
    ResourceConflict(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    StorageError(#[source] shelf_dal::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<shelf_dal::Error> for ApiError {
    fn from(value: shelf_dal::Error) -> Self {
        match value {
            shelf_dal::Error::RecordNotFound(r) => ApiError::ResourceNotFound(r),
            shelf_dal::Error::DuplicateKey(k) => ApiError::ResourceConflict(k),
            other => ApiError::StorageError(other),
        }
    }
}

/// Error body returned by all API endpoints
#[derive(Debug, Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "0x001"),
            ApiError::StorageError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "0x002"),
            ApiError::InvalidQuery(_) | ApiError::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, "0x003")
            }
            ApiError::ResourceConflict(_) => (StatusCode::CONFLICT, "0x004"),
            ApiError::ResourceNotFound(_) => (StatusCode::NOT_FOUND, "0x005"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!("Request failed: {self:#}");
        } else {
            debug!("Request rejected: {self}");
        }
        let body = ErrorResponse {
            code: code.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
