use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid target URL: {0}")]
    InvalidTargetUrl(String),

    #[error("Invalid code: {0}")]
    InvalidFormat(String),

    #[error("Code already exists: {0}")]
    CodeConflict(String),

    #[error("Could not allocate a free code after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },

    #[error("Link not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Environment variable missing: {0}")]
    MissingEnvVar(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::StoreUnavailable(err.to_string())
    }
}

impl AppError {
    /// Client-side errors are returned before the store is touched and are never retried.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidTargetUrl(_)
                | AppError::InvalidFormat(_)
                | AppError::CodeConflict(_)
                | AppError::NotFound(_)
        )
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            tracing::debug!("Rejected request: {}", self);
        }

        let (status, error_message, error_code) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string(), "NOT_FOUND"),
            AppError::InvalidTargetUrl(_) => {
                (StatusCode::BAD_REQUEST, self.to_string(), "INVALID_URL")
            }
            AppError::InvalidFormat(_) => {
                (StatusCode::BAD_REQUEST, self.to_string(), "INVALID_CODE")
            }
            AppError::CodeConflict(_) => (StatusCode::CONFLICT, self.to_string(), "CODE_EXISTS"),
            AppError::AllocationExhausted { .. } => {
                tracing::error!("{}", self);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "No free code available, try again later".to_string(),
                    "ALLOCATION_EXHAUSTED",
                )
            }
            AppError::StoreUnavailable(e) => {
                tracing::error!("Store error: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Storage is temporarily unavailable".to_string(),
                    "STORE_UNAVAILABLE",
                )
            }
            AppError::Migration(e) => {
                tracing::error!("Migration error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Migration error occurred".to_string(),
                    "MIGRATION_ERROR",
                )
            }
            _ => {
                tracing::error!("Internal error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    "INTERNAL_ERROR",
                )
            }
        };

        let body = json!({
            "error": error_code,
            "message": error_message,
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for AppResult
pub type AppResult<T> = Result<T, AppError>;
