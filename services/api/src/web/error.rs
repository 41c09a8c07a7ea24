//! services/api/src/web/error.rs
//!
//! The request-level error type and its mapping onto HTTP responses.

use crate::pipeline::PipelineError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use monogatari_core::ports::PortError;
use serde::Serialize;
use serde_json::json;
use tracing::error;
use utoipa::ToSchema;

/// One field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Body of every non-2xx JSON response.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<FieldIssue>>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input")]
    Validation(Vec<FieldIssue>),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PortError> for AppError {
    fn from(e: PortError) -> Self {
        match e {
            PortError::NotFound(what) => AppError::NotFound(what),
            PortError::Unauthorized => AppError::Unauthorized("Invalid token".to_string()),
            PortError::Conflict(what) => AppError::Conflict(what),
            PortError::Unexpected(detail) => AppError::Internal(detail),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Port(port) => port.into(),
            PipelineError::Authorization(story_id) => AppError::NotFound(format!("Story {} not found", story_id)),
            PipelineError::AlreadyInProgress { .. } => AppError::Conflict(e.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(issues) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Invalid input".to_string(),
                    issues: Some(issues),
                },
            ),
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: format!("Unauthorized: {}", message),
                    issues: None,
                },
            ),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, ErrorResponse { error: message, issues: None }),
            AppError::Conflict(message) => (StatusCode::CONFLICT, ErrorResponse { error: message, issues: None }),
            AppError::Internal(detail) => {
                error!("Request failed: {}", detail);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response();
            }
        };
        (status, Json(body)).into_response()
    }
}
