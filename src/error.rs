use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Error type shared by the stores, services and handlers.
///
/// Every variant maps to a stable `code` and an HTTP status:
///
/// ```json
/// {"code": "NOT_FOUND", "message": "Lead not found"}
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed, out-of-range or unknown-enum input. HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// Email uniqueness violation on users or leads. HTTP 400.
    #[error("Email already exists")]
    DuplicateEmail,

    /// Unknown email or wrong password; the two are never distinguished. HTTP 401.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed or expired session. HTTP 401.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Missing row, or a row owned by somebody else. HTTP 404.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Anything unexpected. Logged, never echoed to the client. HTTP 500.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::DuplicateEmail => "DUPLICATE_EMAIL",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::DuplicateEmail => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return AppError::DuplicateEmail;
            }
        }
        AppError::Internal(anyhow::Error::new(e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                "Something went wrong!".to_string()
            }
            other => other.to_string(),
        };
        let body = serde_json::json!({
            "code": self.code(),
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}
