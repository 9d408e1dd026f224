//! Application error handling
//!
//! This module provides unified error handling for the API,
//! converting internal errors to appropriate HTTP responses.
//!
//! Plan generation failures carry a typed [`PlanError`] rather than being
//! classified by message inspection, so each boundary (model client,
//! storage) reports its own kind explicitly.

use crate::services::plans::PlanError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use macroplan_shared::types::{ErrorDetail, ErrorResponse};
use thiserror::Error;
use tracing::error;

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Database(err) => {
                error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            ApiError::Plan(plan_err) => plan_error_parts(plan_err),
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field: None,
            },
        });

        (status, body).into_response()
    }
}

fn plan_error_parts(err: &PlanError) -> (StatusCode, &'static str, String) {
    match err {
        PlanError::InvalidUserData(errors) => (
            StatusCode::BAD_REQUEST,
            "INVALID_USER_DATA",
            errors.join("; "),
        ),
        PlanError::RateLimitExceeded => (
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMIT_EXCEEDED",
            "Plan generation limit reached, try again later".to_string(),
        ),
        PlanError::Model(model_err) => {
            error!("Plan model error surfaced to caller: {:?}", model_err);
            (
                StatusCode::BAD_GATEWAY,
                "MODEL_ERROR",
                "Plan generation service unavailable".to_string(),
            )
        }
        PlanError::SchemaValidation(errors) => {
            error!("Generated plan failed schema validation: {:?}", errors);
            (
                StatusCode::BAD_GATEWAY,
                "SCHEMA_VALIDATION_FAILED",
                "Generated plan was malformed".to_string(),
            )
        }
        PlanError::Storage(db_err) => {
            error!("Plan storage error: {:?}", db_err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                "Failed to save the generated plan".to_string(),
            )
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
