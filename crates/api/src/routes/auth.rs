//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /{provider}/login  -> login
/// POST /refresh           -> refresh
/// GET  /logout            -> logout (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{provider}/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", get(auth::logout))
}
