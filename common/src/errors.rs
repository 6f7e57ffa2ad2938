//! Application error types.
//!
//! One taxonomy is shared by the client and the services. On the service side
//! every variant maps to an HTTP status and an [`ErrorBody`]; on the client
//! side every failure of a request ends up as one of these variants.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ErrorBody;

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Coarse error category, used to pick how a failure is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any network call.
    Validation,
    /// Transport failure or timeout.
    Network,
    /// Non-2xx response from the backend.
    Http,
    /// 2xx response whose body could not be understood.
    UnexpectedResponse,
    /// Id or name missing from a list, resolved locally or by a service.
    NotFound,
    /// Local configuration or filesystem failure.
    Local,
}

/// Application error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// A download or lookup was attempted without a complete selection.
    #[error("selection incomplete: {0}")]
    SelectionIncomplete(String),

    /// Request parameters are invalid.
    #[error("validation error: {0}")]
    Validation(String),

    /// The backend could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The request did not finish within the configured duration.
    #[error("request timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The backend answered with a body of an unexpected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Local I/O failure (saving a dump, reading fixtures).
    #[error("I/O error: {0}")]
    Io(String),

    /// Anything else that went wrong inside a service.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::SelectionIncomplete(_) | AppError::Validation(_) => ErrorKind::Validation,
            AppError::Network(_) | AppError::Timeout(_) => ErrorKind::Network,
            AppError::Http { .. } | AppError::Internal(_) => ErrorKind::Http,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::UnexpectedResponse(_) => ErrorKind::UnexpectedResponse,
            AppError::Config(_) | AppError::Io(_) => ErrorKind::Local,
        }
    }

    /// Whether the error was raised before any request left the process.
    pub fn is_client_side(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::SelectionIncomplete(what) => format!("Selection incomplete: {}", what),
            AppError::Validation(msg) => format!("Invalid request: {}", msg),
            AppError::Network(msg) => format!("Could not reach the server: {}", msg),
            AppError::Timeout(limit) => {
                format!("Request timed out after {} ms", limit.as_millis())
            }
            AppError::Http { message, .. } => message.clone(),
            AppError::UnexpectedResponse(msg) => {
                format!("Unexpected response from server: {}", msg)
            }
            AppError::NotFound(what) => format!("Not found: {}", what),
            AppError::Config(msg) => format!("Configuration error: {}", msg),
            AppError::Io(msg) => format!("Could not save file: {}", msg),
            AppError::Internal(msg) => format!("Internal error: {}", msg),
        }
    }

    /// HTTP status code used when the error is returned by a service.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::SelectionIncomplete(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Network(_) | AppError::UnexpectedResponse(_) => StatusCode::BAD_GATEWAY,
            AppError::Http { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Config(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short title placed in the `error` field of an [`ErrorBody`].
    fn title(&self) -> &'static str {
        match self {
            AppError::SelectionIncomplete(_) | AppError::Validation(_) => "Invalid request",
            AppError::NotFound(_) => "Not found",
            AppError::Timeout(_) => "Upstream timeout",
            AppError::Network(_) | AppError::UnexpectedResponse(_) => "Upstream failure",
            AppError::Http { .. } => "Upstream error",
            AppError::Config(_) | AppError::Io(_) | AppError::Internal(_) => {
                "Internal server error"
            }
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let body = ErrorBody {
            error: self.title().to_string(),
            message: Some(self.to_string()),
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}
