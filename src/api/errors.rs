//! API Error Handling
//!
//! Structured error responses with proper HTTP status codes and request
//! tracking. Domain errors are mapped here so handlers can use `?` on the
//! game core directly.

use crate::errors::TambolaError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level API error response with request tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub request_id: String,
    pub error: ErrorBody,
}

/// Error body with structured information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error code (NOT_FOUND, BAD_REQUEST, CONFLICT, INTERNAL_ERROR)
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// API error with the request id it occurred under
#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub request_id: String,
}

#[derive(Debug)]
pub enum ApiErrorKind {
    NotFound(String),
    BadRequest(String),
    /// Duplicate or already-processed conditions; terminal for this
    /// request, resolvable only by a distinct new request.
    Conflict(String),
    InternalError(String),
}

impl ApiError {
    pub fn not_found(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::NotFound(message),
            request_id,
        }
    }

    pub fn bad_request(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::BadRequest(message),
            request_id,
        }
    }

    /// Map a domain error onto the HTTP taxonomy.
    pub fn from_domain(request_id: String, err: TambolaError) -> Self {
        use TambolaError::*;
        let message = err.to_string();
        let kind = match err {
            GameNotFound(_) | TicketNotFound(_) | ClaimNotFound(_) | UserNotFound(_)
            | TransactionNotFound(_) => ApiErrorKind::NotFound(message),

            DuplicateNumber { .. }
            | DuplicateClaim { .. }
            | ClaimAlreadyProcessed { .. }
            | TransactionAlreadyProcessed { .. } => ApiErrorKind::Conflict(message),

            NumberOutOfRange(_)
            | ClaimNotEligible { .. }
            | InsufficientBalance { .. }
            | GameAlreadyStarted { .. }
            | GameFull { .. }
            | TicketGameMismatch { .. }
            | InvalidGame(_)
            | InvalidAmount(_) => ApiErrorKind::BadRequest(message),

            TicketGeneration { .. } | Configuration(_) => {
                ApiErrorKind::InternalError(message)
            }
        };
        Self { kind, request_id }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ApiErrorKind::NotFound(msg) => write!(f, "[{}] Not Found: {}", self.request_id, msg),
            ApiErrorKind::BadRequest(msg) => {
                write!(f, "[{}] Bad Request: {}", self.request_id, msg)
            }
            ApiErrorKind::Conflict(msg) => write!(f, "[{}] Conflict: {}", self.request_id, msg),
            ApiErrorKind::InternalError(msg) => {
                write!(f, "[{}] Internal Error: {}", self.request_id, msg)
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self.kind {
            ApiErrorKind::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiErrorKind::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiErrorKind::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            ApiErrorKind::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        let body = Json(ErrorResponse {
            request_id: self.request_id.clone(),
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}
