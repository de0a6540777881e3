pub mod auth;
pub mod events;
pub mod health;

use axum::Router;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/{provider}/login                           provider sign-in (public)
/// /auth/refresh                                    rotate token pair (public)
/// /auth/logout                                     revoke session (bearer)
///
/// /events                                          list (newest first)
/// /events/{id}                                     get
/// /events/user/{id}                                events a user belongs to
/// /events/create                                   create (POST)
/// /events/like                                     like (POST)
/// /events/dislike                                  remove like (DELETE)
/// /events/create-invite                            invite code (POST)
/// /events/verify-invite                            join via invite (POST)
/// /events/upload-photos                            multipart upload (POST)
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/events", events::router(config.max_upload_bytes))
}
