//! Board Error Types
//!
//! This module provides board-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use ledger::LedgerError;
use thiserror::Error;

/// Board-specific result type alias
pub type BoardResult<T> = Result<T, BoardError>;

/// Board-specific error variants
#[derive(Debug, Error)]
pub enum BoardError {
    /// Unknown request id
    #[error("Request not found")]
    RequestNotFound,

    /// Unknown answer id
    #[error("Answer not found")]
    AnswerNotFound,

    /// Unknown report id
    #[error("Report not found")]
    ReportNotFound,

    /// Unknown user id (requester, author, or reporter)
    #[error("User not found")]
    UserNotFound,

    /// Acting user is deactivated
    #[error("User is not active")]
    UserInactive,

    /// The request is already closed (or already settled)
    #[error("Request is closed")]
    RequestClosed,

    /// The target answer is hidden
    #[error("Answer is hidden")]
    AnswerHidden,

    /// The request already has a selected answer
    #[error("An answer was already selected")]
    AlreadySelected,

    /// A free-standing share cannot be selected
    #[error("Answer does not belong to a request")]
    NotARequestAnswer,

    /// Caller does not own the parent request
    #[error("Only the requester may select an answer")]
    NotRequestOwner,

    /// Daily submission cap exceeded
    #[error("Daily submission cap of {cap} reached")]
    RateLimited { cap: i64 },

    /// Optimistic lock lost: the record changed since it was loaded
    #[error("Version conflict: record was modified concurrently")]
    VersionConflict,

    /// Reward pool must be a positive amount
    #[error("Invalid reward pool: {0}")]
    InvalidRewardPool(i64),

    /// Rejected answer content (empty, too long)
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// Ledger failure (insufficient funds, zero amount, unknown account)
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BoardError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            BoardError::RequestNotFound
            | BoardError::AnswerNotFound
            | BoardError::ReportNotFound
            | BoardError::UserNotFound => StatusCode::NOT_FOUND,
            BoardError::RequestClosed
            | BoardError::AnswerHidden
            | BoardError::AlreadySelected
            | BoardError::NotARequestAnswer => StatusCode::UNPROCESSABLE_ENTITY,
            BoardError::UserInactive | BoardError::NotRequestOwner => StatusCode::FORBIDDEN,
            BoardError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            BoardError::VersionConflict => StatusCode::CONFLICT,
            BoardError::InvalidRewardPool(_) | BoardError::InvalidContent(_) => {
                StatusCode::BAD_REQUEST
            }
            BoardError::Ledger(e) => e.status_code(),
            BoardError::Database(_) | BoardError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BoardError::RequestNotFound
            | BoardError::AnswerNotFound
            | BoardError::ReportNotFound
            | BoardError::UserNotFound => ErrorKind::NotFound,
            BoardError::RequestClosed
            | BoardError::AnswerHidden
            | BoardError::AlreadySelected
            | BoardError::NotARequestAnswer => ErrorKind::UnprocessableEntity,
            BoardError::UserInactive | BoardError::NotRequestOwner => ErrorKind::Forbidden,
            BoardError::RateLimited { .. } => ErrorKind::TooManyRequests,
            BoardError::VersionConflict => ErrorKind::Conflict,
            BoardError::InvalidRewardPool(_) | BoardError::InvalidContent(_) => {
                ErrorKind::BadRequest
            }
            BoardError::Ledger(e) => e.kind(),
            BoardError::Database(_) | BoardError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// True when the caller can reasonably reload and retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, BoardError::VersionConflict)
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            BoardError::Database(e) => {
                tracing::error!(error = %e, "Board database error");
            }
            BoardError::Internal(msg) => {
                tracing::error!(message = %msg, "Board internal error");
            }
            BoardError::VersionConflict => {
                tracing::warn!("Optimistic lock conflict");
            }
            BoardError::RateLimited { cap } => {
                tracing::warn!(cap, "Submission cap exceeded");
            }
            _ => {
                tracing::debug!(error = %self, "Board error");
            }
        }
    }
}

impl From<BoardError> for AppError {
    fn from(err: BoardError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        let app_err = AppError::new(kind, message);
        if err.is_retryable() {
            app_err.with_action("Reload the record and retry")
        } else {
            app_err
        }
    }
}

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        // Return empty body for security (don't leak details)
        (status, ()).into_response()
    }
}
