use std::sync::Arc;

use mercuria_core::storage::ObjectStorage;

use crate::auth::session::SessionManager;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: mercuria_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Login, refresh, logout and request authentication.
    pub sessions: Arc<SessionManager>,
    /// Photo bucket.
    pub storage: Arc<dyn ObjectStorage>,
}
