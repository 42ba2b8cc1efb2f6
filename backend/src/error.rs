use crate::database::DatabaseError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sqlx::Error as SqlxError;
use thiserror::Error;
use tracing::{debug, error};

/// Stable, machine-readable error codes returned in every error payload.
///
/// Clients match on `code` from `{"code": "NOT_FOUND", "message": "..."}`;
/// messages may be reworded, codes never change.
pub mod error_code {
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFLICT: &str = "CONFLICT";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database errors
    #[error("SQL error: {0}")]
    Sqlx(#[from] SqlxError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Missing or invalid credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Business rule violations (duplicate records, used coupons, ...)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Generic error with message
    #[error("{0}")]
    Message(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Get HTTP status code for the error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code for the JSON payload
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => error_code::VALIDATION_FAILED,
            AppError::Unauthorized(_) => error_code::UNAUTHENTICATED,
            AppError::Forbidden(_) => error_code::PERMISSION_DENIED,
            AppError::NotFound(_) => error_code::NOT_FOUND,
            AppError::Conflict(_) => error_code::CONFLICT,
            AppError::Database(_) | AppError::Sqlx(_) => error_code::DATABASE_ERROR,
            _ => error_code::INTERNAL,
        }
    }

    /// Message exposed to clients. Server-side failures are logged and
    /// replaced by a generic text so driver details never leak.
    fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Database(_) | AppError::Sqlx(_) => "Database error".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = serde_json::json!({
            "code": self.error_code(),
            "message": self.public_message(),
        });
        (status, axum::Json(body)).into_response()
    }
}

/// Repository-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database query error
    #[error("Query error: {0}")]
    Query(SqlxError),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Duplicate record
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Business rule violation (e.g., coupon already used)
    #[error("Business rule violation: {0}")]
    BusinessRule(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => AppError::NotFound(msg),
            RepositoryError::Query(e) => AppError::Sqlx(e),
            RepositoryError::Duplicate(msg) => AppError::Conflict(msg),
            RepositoryError::ConstraintViolation(msg) => AppError::Conflict(msg),
            RepositoryError::InvalidInput(msg) => AppError::Validation(msg),
            RepositoryError::BusinessRule(msg) => AppError::Conflict(msg),
        }
    }
}

impl From<SqlxError> for RepositoryError {
    fn from(err: SqlxError) -> Self {
        match &err {
            SqlxError::RowNotFound => RepositoryError::NotFound("Record not found".to_string()),
            SqlxError::Database(db_err) => {
                // PostgreSQL error codes
                let code = db_err.code().map(|c| c.to_string());
                debug!("Database error {:?}: {}", code, db_err.message());
                match code.as_deref() {
                    // Unique violation
                    Some("23505") => {
                        RepositoryError::Duplicate(duplicate_message(db_err.constraint()))
                    }
                    // Foreign key violation
                    Some("23503") => RepositoryError::ConstraintViolation(
                        "The record is referenced by or refers to missing data".to_string(),
                    ),
                    // Check constraint violation
                    Some("23514") => {
                        RepositoryError::InvalidInput("A value is outside its allowed set".to_string())
                    }
                    // Numeric value out of range
                    Some("22003") => {
                        RepositoryError::InvalidInput("A numeric value is out of range".to_string())
                    }
                    _ => RepositoryError::Query(err),
                }
            }
            _ => RepositoryError::Query(err),
        }
    }
}

/// Client-facing text for a unique violation on `constraint`
fn duplicate_message(constraint: Option<&str>) -> String {
    match constraint {
        Some("users_email_key") => "A user with this email already exists",
        Some("professors_email_key") => "A professor with this email already exists",
        Some("subjects_name_key") => "A subject with this name already exists",
        _ => "A record with the same unique value already exists",
    }
    .to_string()
}
