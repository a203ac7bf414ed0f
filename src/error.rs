use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::orchestration::PipelineError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::MissingField(_) => AppError::BadRequest(err.to_string()),
            PipelineError::HouseNotFound(_) => AppError::NotFound("house not found".to_string()),
            PipelineError::AffiliateNotFound(_) => {
                AppError::NotFound("affiliate not found".to_string())
            }
            PipelineError::Directory(e) => AppError::Internal(e.to_string()),
            PipelineError::Storage(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                // Partner houses retry on 5xx; the fault detail stays in the
                // logs, not on the wire.
                tracing::error!(error = %msg, "internal processing error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal processing error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
