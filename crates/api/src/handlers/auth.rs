//! Handlers for the `/auth` resource (provider login, refresh, logout).

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use mercuria_core::identity::{DirectoryUser, Provider};
use mercuria_core::types::EntityId;
use mercuria_core::validation::{parse_entity_id, require_field};
use mercuria_db::repositories::EventRepo;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::TokenPair;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::handlers::bounded;
use crate::middleware::auth::bearer_token;
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/{provider}/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default, alias = "provider_token")]
    pub id_token: String,
    /// Event to join on sign-in.
    #[serde(default)]
    pub invite: Option<String>,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Token pair as returned to clients.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: pair.expires_in,
        }
    }
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenResponse,
    pub user: DirectoryUser,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/{provider}/login
///
/// Verify a provider ID token, resolve the user, and open a session. A valid
/// `invite` adds the user to that event; failing to do so does not fail the
/// login.
pub async fn login(
    State(state): State<AppState>,
    AppPath(provider): AppPath<String>,
    AppJson(input): AppJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let provider: Provider = provider.parse().map_err(AppError::BadRequest)?;
    require_field("id_token", &input.id_token)?;
    let invite: Option<EntityId> = input
        .invite
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_entity_id("invite", v))
        .transpose()?;

    let claim = state.sessions.verify_claim(provider, &input.id_token).await?;
    let outcome = state.sessions.login(&claim).await?;

    if let Some(event_id) = invite {
        let joined = bounded(
            &state,
            "database",
            EventRepo::add_member(&state.pool, outcome.user.id, event_id),
        )
        .await;
        match joined {
            Ok(added) => {
                tracing::info!(user_id = %outcome.user.id, %event_id, added, "Invite applied at login")
            }
            Err(e) => tracing::warn!(
                user_id = %outcome.user.id,
                %event_id,
                error = %e,
                "Could not apply invite at login",
            ),
        }
    }

    Ok(Json(LoginResponse {
        tokens: outcome.tokens.into(),
        user: outcome.user,
    }))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a refresh token for a new pair. Each refresh token works once.
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(input): AppJson<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    require_field("refresh_token", &input.refresh_token)?;
    let tokens = state.sessions.refresh(&input.refresh_token).await?;
    Ok(Json(tokens.into()))
}

/// GET /api/v1/auth/logout
///
/// Revoke the presented access token and its paired refresh token.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<MessageResponse>> {
    let token = bearer_token(&headers)?;
    state.sessions.logout(token).await?;
    Ok(Json(MessageResponse::SUCCESS))
}
