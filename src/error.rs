// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The session could not be tied to a stored user.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// A mutating adapter call carried properties outside its allow-list.
    #[error("Unsupported {entity} properties: {}", fields.join(", "))]
    UnsupportedFields {
        entity: &'static str,
        fields: Vec<String>,
    },

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    #[error("OAuth error: {0}")]
    OAuth(String),

    /// An OAuth sign-in matched an existing user by email only.
    #[error("Account not linked: {0}")]
    AccountNotLinked(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized(msg) => {
                tracing::info!(reason = %msg, "Session rejected");
                (StatusCode::UNAUTHORIZED, "unauthorized", None)
            }
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::UnsupportedFields { .. } => {
                tracing::error!(error = %self, "Adapter received unsupported properties");
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", None)
            }
            AppError::NotImplemented(_) => {
                tracing::error!(error = %self, "Unimplemented adapter method reached");
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", None)
            }
            AppError::OAuth(msg) => {
                tracing::warn!(error = %msg, "OAuth callback failed");
                (StatusCode::BAD_GATEWAY, "oauth_error", Some(msg.clone()))
            }
            AppError::AccountNotLinked(msg) => (
                StatusCode::FORBIDDEN,
                "account_not_linked",
                Some(msg.clone()),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl AppError {
    /// Build the error for a remainder of unsupported properties, or `None`
    /// when the remainder is empty.
    pub fn unsupported<'a>(
        entity: &'static str,
        extra: impl IntoIterator<Item = &'a String>,
    ) -> Option<Self> {
        let mut fields: Vec<String> = extra.into_iter().cloned().collect();
        if fields.is_empty() {
            return None;
        }
        fields.sort();
        Some(AppError::UnsupportedFields { entity, fields })
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
