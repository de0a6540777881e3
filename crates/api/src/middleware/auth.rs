//! Session-backed authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use mercuria_core::types::{EntityId, SessionId};

use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a Bearer access token in the
/// `Authorization` header.
///
/// The token must verify and its session record must still be live, so a
/// logged-out token is rejected even before it expires.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: EntityId,
    pub session_id: SessionId,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let session = state.sessions.authenticate(token).await?;

        Ok(AuthUser {
            user_id: session.user_id,
            session_id: session.session_id,
        })
    }
}

/// Read the token from `Authorization: Bearer <token>`.
///
/// A missing or malformed header is a bad request rather than a failed
/// authentication.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Authorization header".into()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::BadRequest("Invalid Authorization format. Expected: Bearer <token>".into())
        })
}
