use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use flightbay_core::error::{CoreError, UploadError};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`UploadError`] for the
/// upload protocol taxonomy. Implements [`IntoResponse`] to produce the
/// wire error object `{errorTitle, errorMessage}`; its presence, not the
/// HTTP status, is what callers check before assuming success.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `flightbay-core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An upload protocol error.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A missing resource with a human-readable message.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or malformed uploader context.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, title, message) = match &self {
            AppError::Upload(err) => {
                let status = match err {
                    UploadError::InvalidFilename => StatusCode::BAD_REQUEST,
                    UploadError::HashConflict => StatusCode::CONFLICT,
                    // A success signal in the protocol: the error object
                    // rides on a 200 and the client treats the file as
                    // complete.
                    UploadError::AlreadyUploaded => StatusCode::OK,
                    UploadError::HashFailed(_) | UploadError::ChunkUploadFailed(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    UploadError::AssemblyCorruption => {
                        tracing::error!(error = %err, "Assembly corruption");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                    UploadError::UploadNotFound => StatusCode::NOT_FOUND,
                };
                (status, err.error_title().to_string(), err.error_message())
            }

            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "Not Found".to_string(),
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "Bad Request".to_string(), msg.clone())
                }
                CoreError::Conflict(msg) => {
                    (StatusCode::CONFLICT, "Conflict".to_string(), msg.clone())
                }
                CoreError::Forbidden(msg) => {
                    (StatusCode::FORBIDDEN, "Forbidden".to_string(), msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Server Error".to_string(),
                        "An internal error occurred".to_string(),
                    )
                }
            },

            AppError::Database(err) => classify_sqlx_error(err),

            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad Request".to_string(), msg.clone())
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, "Not Found".to_string(), msg.clone())
            }
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized".to_string(),
                msg.clone(),
            ),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server Error".to_string(),
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "errorTitle": title,
            "errorMessage": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error title, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, String, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "Not Found".to_string(),
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "Conflict".to_string(),
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server Error".to_string(),
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server Error".to_string(),
                "An internal error occurred".to_string(),
            )
        }
    }
}
