//! Ledger Error Types
//!
//! This module provides ledger-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Ledger-specific result type alias
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-specific error variants
///
/// These are domain-specific errors that map to appropriate HTTP status codes
/// and can be converted to `AppError` for unified error handling.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Target user does not exist in the user directory
    #[error("User not found")]
    UserNotFound,

    /// Zero-amount post, or an amount inconsistent with the entry type
    #[error("Invalid point amount: {0}")]
    InvalidAmount(i64),

    /// User-initiated deduction exceeding the current balance
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: i64, requested: i64 },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::UserNotFound => StatusCode::NOT_FOUND,
            LedgerError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            LedgerError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            LedgerError::Database(_) | LedgerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::UserNotFound => ErrorKind::NotFound,
            LedgerError::InvalidAmount(_) => ErrorKind::BadRequest,
            LedgerError::InsufficientFunds { .. } => ErrorKind::PaymentRequired,
            LedgerError::Database(_) | LedgerError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            LedgerError::Database(e) => {
                tracing::error!(error = %e, "Ledger database error");
            }
            LedgerError::Internal(msg) => {
                tracing::error!(message = %msg, "Ledger internal error");
            }
            LedgerError::InsufficientFunds {
                balance,
                requested,
            } => {
                tracing::warn!(balance, requested, "Deduction rejected, insufficient funds");
            }
            _ => {
                tracing::debug!(error = %self, "Ledger error");
            }
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        AppError::new(kind, message)
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        // Return empty body for security (don't leak details)
        (status, ()).into_response()
    }
}
