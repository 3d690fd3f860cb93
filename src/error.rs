// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::intake::IntakeError;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Checkout error: {0}")]
    Checkout(String),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Local storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message the backend returns when a user token is missing, invalid or expired.
    pub const BACKEND_AUTH_ERROR: &'static str = "backend rejected credentials";

    /// Whether this error means the backend refused the caller's credentials.
    pub fn is_backend_auth_error(&self) -> bool {
        matches!(self, AppError::Backend(msg) if msg.contains(Self::BACKEND_AUTH_ERROR))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

/// Response extension marking a backend credential rejection, so the auth
/// middleware can reset the session that carried the token.
#[derive(Debug, Clone, Copy)]
pub struct BackendAuthRejected;

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let auth_rejected = self.is_backend_auth_error();
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Backend(msg) => (StatusCode::BAD_GATEWAY, "backend_error", Some(msg.clone())),
            AppError::Checkout(msg) => {
                (StatusCode::BAD_GATEWAY, "checkout_error", Some(msg.clone()))
            }
            AppError::Email(msg) => (StatusCode::BAD_GATEWAY, "email_error", Some(msg.clone())),
            AppError::NotConfigured(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "not_configured",
                Some(msg.clone()),
            ),
            AppError::Storage(msg) => {
                tracing::error!(error = %msg, "Local storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None)
            }
            AppError::Intake(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "unsupported_file",
                Some(err.to_string()),
            ),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        let mut response = (status, Json(body)).into_response();
        if auth_rejected {
            response.extensions_mut().insert(BackendAuthRejected);
        }
        response
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
