//! Handlers for the `/events` resource: reads, creation, likes and invites.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use mercuria_core::error::CoreError;
use mercuria_core::event_graph::Event;
use mercuria_core::types::EntityId;
use mercuria_core::validation::{parse_entity_id, require_field};
use mercuria_db::models::event::CreateEvent;
use mercuria_db::repositories::EventRepo;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::extract::{AppJson, AppPath};
use crate::handlers::bounded;
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /events/create`.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "owner_id")]
    pub owner: String,
}

/// Request body for `POST /events/like` and `DELETE /events/dislike`.
#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub event_id: String,
}

/// Request body for `POST /events/create-invite`.
#[derive(Debug, Deserialize)]
pub struct CreateInviteRequest {
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub created_by: String,
}

/// Request body for `POST /events/verify-invite`.
#[derive(Debug, Deserialize)]
pub struct VerifyInviteRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub invite: String,
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    /// Opaque invite code. Currently the event id itself.
    pub invite: EntityId,
}

fn parse_pair(
    first: (&str, &str),
    second: (&str, &str),
) -> Result<(EntityId, EntityId), CoreError> {
    Ok((
        parse_entity_id(first.0, first.1)?,
        parse_entity_id(second.0, second.1)?,
    ))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/events
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Event>>>> {
    let events = bounded(&state, "database", EventRepo::list(&state.pool)).await?;
    Ok(Json(DataResponse { data: events }))
}

/// GET /api/v1/events/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<String>,
) -> AppResult<Json<DataResponse<Event>>> {
    let id = parse_entity_id("id", &id)?;
    let event = bounded(&state, "database", EventRepo::find_by_id(&state.pool, id))
        .await?
        .ok_or(CoreError::NotFound { entity: "Event", id })?;
    Ok(Json(DataResponse { data: event }))
}

/// GET /api/v1/events/user/{id}
///
/// Events the user belongs to, newest first.
pub async fn list_for_user(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(user_id): AppPath<String>,
) -> AppResult<Json<DataResponse<Vec<Event>>>> {
    let user_id = parse_entity_id("id", &user_id)?;
    let events = bounded(
        &state,
        "database",
        EventRepo::list_for_user(&state.pool, user_id),
    )
    .await?;
    Ok(Json(DataResponse { data: events }))
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// POST /api/v1/events/create
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(input): AppJson<CreateEventRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Event>>)> {
    require_field("name", &input.name)?;
    let owner = parse_entity_id("owner", &input.owner)?;
    let create = CreateEvent {
        name: input.name.trim().to_string(),
        owner,
    };

    let id = bounded(&state, "database", EventRepo::create(&state.pool, &create)).await?;
    tracing::info!(event_id = %id, owner = %owner, created_by = %user.user_id, "Event created");

    let event = bounded(&state, "database", EventRepo::find_by_id(&state.pool, id))
        .await?
        .ok_or(CoreError::NotFound { entity: "Event", id })?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: event })))
}

/// POST /api/v1/events/like
pub async fn like(
    State(state): State<AppState>,
    _user: AuthUser,
    AppJson(input): AppJson<LikeRequest>,
) -> AppResult<Json<MessageResponse>> {
    let (user_id, event_id) =
        parse_pair(("user_id", &input.user_id), ("event_id", &input.event_id))?;
    bounded(&state, "database", EventRepo::like(&state.pool, user_id, event_id)).await?;
    Ok(Json(MessageResponse::SUCCESS))
}

/// DELETE /api/v1/events/dislike
///
/// Removing a like that does not exist still succeeds.
pub async fn dislike(
    State(state): State<AppState>,
    _user: AuthUser,
    AppJson(input): AppJson<LikeRequest>,
) -> AppResult<Json<MessageResponse>> {
    let (user_id, event_id) =
        parse_pair(("user_id", &input.user_id), ("event_id", &input.event_id))?;
    let removed = bounded(
        &state,
        "database",
        EventRepo::dislike(&state.pool, user_id, event_id),
    )
    .await?;
    tracing::debug!(%user_id, %event_id, removed, "Like removed");
    Ok(Json(MessageResponse::SUCCESS))
}

/// POST /api/v1/events/create-invite
pub async fn create_invite(
    State(state): State<AppState>,
    _user: AuthUser,
    AppJson(input): AppJson<CreateInviteRequest>,
) -> AppResult<Json<DataResponse<InviteResponse>>> {
    let (event_id, created_by) =
        parse_pair(("event_id", &input.event_id), ("created_by", &input.created_by))?;

    // The invite is only handed out for an event that exists.
    bounded(&state, "database", EventRepo::find_by_id(&state.pool, event_id))
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Event",
            id: event_id,
        })?;

    tracing::info!(%event_id, %created_by, "Invite created");
    Ok(Json(DataResponse {
        data: InviteResponse { invite: event_id },
    }))
}

/// POST /api/v1/events/verify-invite
///
/// Join the invited event. Joining twice is not an error.
pub async fn verify_invite(
    State(state): State<AppState>,
    _user: AuthUser,
    AppJson(input): AppJson<VerifyInviteRequest>,
) -> AppResult<Json<MessageResponse>> {
    let (user_id, event_id) =
        parse_pair(("user_id", &input.user_id), ("invite", &input.invite))?;
    let added = bounded(
        &state,
        "database",
        EventRepo::add_member(&state.pool, user_id, event_id),
    )
    .await?;
    tracing::info!(%user_id, %event_id, added, "Invite verified");
    Ok(Json(MessageResponse::SUCCESS))
}
