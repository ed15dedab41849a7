use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::models::BetStatus;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Settlement error: {0}")]
    Settlement(#[from] SettlementError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized")]
    Unauthorized,
}

/// Settlement-related errors
#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("Bet not found: {0}")]
    BetNotFound(Uuid),

    #[error("Bet {bet_id} already settled as {status}")]
    AlreadySettled { bet_id: Uuid, status: BetStatus },

    #[error("Invalid settlement status: {0}")]
    InvalidStatus(String),
}

/// API error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            AppError::Settlement(SettlementError::BetNotFound(id)) => (
                StatusCode::NOT_FOUND,
                "BET_NOT_FOUND",
                format!("Bet not found: {}", id),
                None,
            ),
            AppError::Settlement(SettlementError::AlreadySettled { bet_id, status }) => (
                StatusCode::BAD_REQUEST,
                "ALREADY_SETTLED",
                format!("Bet {} already settled", bet_id),
                Some(serde_json::json!({ "bet_id": bet_id, "status": status })),
            ),
            AppError::Settlement(SettlementError::InvalidStatus(s)) => (
                StatusCode::BAD_REQUEST,
                "INVALID_STATUS",
                format!("Invalid settlement status: {}", s),
                None,
            ),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Not found: {}", what),
                None,
            ),
            AppError::InvalidInput(msg) => (
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                msg,
                None,
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Unauthorized".to_string(),
                None,
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "A database error occurred".to_string(),
                None,
            ),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                Some(serde_json::json!({ "details": other.to_string() })),
            ),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: message,
            error_code: error_code.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(format!("Error converting: {:?}", error))
    }
}

impl From<rust_decimal::Error> for AppError {
    fn from(error: rust_decimal::Error) -> Self {
        AppError::InvalidInput(format!("Decimal conversion error: {:?}", error))
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        AppError::Internal(format!("Migration error: {:?}", error))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
