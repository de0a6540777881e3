//! Route definitions for the `/events` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{events, photos};
use crate::state::AppState;

/// Routes mounted at `/events`. All require auth.
///
/// ```text
/// GET    /                -> list
/// GET    /{id}            -> get_by_id
/// GET    /user/{id}       -> list_for_user
/// POST   /create          -> create
/// POST   /like            -> like
/// DELETE /dislike         -> dislike
/// POST   /create-invite   -> create_invite
/// POST   /verify-invite   -> verify_invite
/// POST   /upload-photos   -> photos::upload (body limit: `max_upload_bytes`)
/// ```
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(events::list))
        .route("/{id}", get(events::get_by_id))
        .route("/user/{id}", get(events::list_for_user))
        .route("/create", post(events::create))
        .route("/like", post(events::like))
        .route("/dislike", delete(events::dislike))
        .route("/create-invite", post(events::create_invite))
        .route("/verify-invite", post(events::verify_invite))
        .route(
            "/upload-photos",
            post(photos::upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}
