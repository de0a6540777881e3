use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mercuria_core::error::CoreError;
use mercuria_core::identity::ClaimError;
use mercuria_core::storage::UploadError;
use mercuria_core::types::EntityId;
use mercuria_db::repositories::EventQueryError;
use serde_json::json;

use crate::auth::session::SessionError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `mercuria_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failure in login, refresh, logout, or request authentication.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An event read that failed in the query or while folding rows.
    #[error(transparent)]
    EventQuery(#[from] EventQueryError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    /// A photo batch failed after the photos in `stored` were saved.
    #[error("photo batch failed partway: {source}")]
    PartialUpload {
        stored: Vec<EntityId>,
        source: Box<AppError>,
    },

    /// A dependency did not answer within the configured call timeout.
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    /// No route matches the request path.
    #[error("No route for {0}")]
    RouteNotFound(String),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

type Classified = (StatusCode, &'static str, String, Option<String>);

fn internal() -> Classified {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
        None,
    )
}

fn upstream(message: &str) -> Classified {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        "UPSTREAM_ERROR",
        message.to_string(),
        None,
    )
}

impl AppError {
    fn classify(&self) -> Classified {
        match self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                    None,
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
                }
            },

            // --- Session lifecycle ---
            AppError::Session(err) => classify_session_error(err),

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::EventQuery(EventQueryError::Query(err)) => classify_sqlx_error(err),
            AppError::EventQuery(EventQueryError::Scan(err)) => {
                tracing::error!(error = %err, "Event rows could not be assembled");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SCAN_ERROR",
                    "Event data could not be read".to_string(),
                    None,
                )
            }

            // --- Dependencies ---
            AppError::Upload(err) => {
                tracing::error!(error = %err, "Photo upload failed");
                upstream("Photo storage unavailable")
            }
            AppError::PartialUpload { stored, source } => {
                let (status, code, message, _) = source.classify();
                let ids: Vec<String> = stored.iter().map(ToString::to_string).collect();
                (status, code, message, Some(format!("stored photos: {}", ids.join(","))))
            }
            AppError::Timeout(dependency) => (
                StatusCode::GATEWAY_TIMEOUT,
                "TIMEOUT",
                "A backing service did not respond in time".to_string(),
                Some(dependency.to_string()),
            ),

            // --- HTTP-specific errors ---
            AppError::RouteNotFound(path) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("No route for {path}"),
                None,
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.classify();

        let mut body = json!({
            "error": true,
            "code": code,
            "message": message,
        });
        if let Some(details) = details {
            body["details"] = json!(details);
        }

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a session failure. Token problems are the caller's fault and
/// map to 401; store and directory problems are ours and never do.
fn classify_session_error(err: &SessionError) -> Classified {
    match err {
        SessionError::UnknownProvider(provider) => (
            StatusCode::BAD_REQUEST,
            "BAD_REQUEST",
            format!("Identity provider '{provider}' is not enabled"),
            None,
        ),
        SessionError::Claim(ClaimError::Invalid(reason)) => (
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Provider token could not be verified".to_string(),
            Some(reason.clone()),
        ),
        SessionError::Claim(ClaimError::Unavailable(reason)) => {
            tracing::warn!(error = %reason, "Identity provider unavailable");
            upstream("Identity provider unavailable")
        }
        SessionError::InvalidToken(_) => (
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Invalid authorization, please login again".to_string(),
            None,
        ),
        SessionError::InvalidSession => (
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Session has expired or was revoked".to_string(),
            None,
        ),
        SessionError::TokenIssue(e) => {
            tracing::error!(error = %e, "Token signing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ISSUANCE_ERROR",
                "Could not issue session tokens".to_string(),
                None,
            )
        }
        SessionError::Persist(e) => {
            tracing::error!(error = %e, "Session could not be saved");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ISSUANCE_ERROR",
                "Could not issue session tokens".to_string(),
                None,
            )
        }
        SessionError::Store(e) => {
            tracing::error!(error = %e, "Session store failure");
            upstream("Session store unavailable")
        }
        SessionError::Directory(e) => {
            tracing::error!(error = %e, "User directory failure");
            upstream("User directory unavailable")
        }
        SessionError::Timeout(dependency) => (
            StatusCode::GATEWAY_TIMEOUT,
            "TIMEOUT",
            "A backing service did not respond in time".to_string(),
            Some(dependency.to_string()),
        ),
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations map to 409.
/// - Foreign key violations map to 400 (the referenced user or event is missing).
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> Classified {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
            None,
        ),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            // PostgreSQL unique_violation
            Some("23505") => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("Duplicate value violates unique constraint: {constraint}"),
                    None,
                )
            }
            // PostgreSQL foreign_key_violation
            Some("23503") => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Referenced user or event does not exist".to_string(),
                None,
            ),
            _ => {
                tracing::error!(error = %db_err, "Database error");
                internal()
            }
        },
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
