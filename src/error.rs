//! Application error types and result alias.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application result type alias
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error (bad input; never retried)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not-found outcome, distinct from transient failure. Carries
    /// diagnostic context (candidates tried, last stage errors).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transient I/O failure, retryable until the policy is exhausted
    #[error("Service unavailable: {0}")]
    Transient(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Schema or integrity error (missing table, unexpected constraint);
    /// never retried
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Outbound HTTP error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Address parse error
    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Classify a sqlx error into the taxonomy. Connection-class errors
    /// become `Transient` (retryable); constraint violations become
    /// `Validation`; schema errors become `Integrity`.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::Transient(err.to_string())
            }
            sqlx::Error::Database(db) => match db.code().as_deref() {
                // Integrity-constraint class
                Some(code) if code.starts_with("23") => AppError::Validation(db.to_string()),
                // Undefined table/column, syntax class
                Some(code) if code.starts_with("42") => AppError::Integrity(db.to_string()),
                _ => AppError::Database(db.to_string()),
            },
            _ => AppError::Database(err.to_string()),
        }
    }

    /// Whether the shared retry policy may re-attempt after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Transient(_) | AppError::Io(_))
            || matches!(self, AppError::Http(e) if e.is_connect() || e.is_timeout())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Transient(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                msg.clone(),
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Database operation failed".to_string(),
            ),
            AppError::Integrity(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTEGRITY_ERROR",
                "Storage schema error".to_string(),
            ),
            AppError::Migration(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "MIGRATION_ERROR",
                "Database migration failed".to_string(),
            ),
            AppError::Http(_) => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "Upstream request failed".to_string(),
            ),
            AppError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                "IO operation failed".to_string(),
            ),
            AppError::AddrParse(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ADDR_PARSE_ERROR",
                "Invalid address".to_string(),
            ),
            AppError::Json(_) => (
                StatusCode::BAD_REQUEST,
                "JSON_ERROR",
                "Invalid JSON".to_string(),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        // Log the error
        tracing::error!(error = %self, code = code, "Request error");

        let body = Json(json!({
            "code": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}
