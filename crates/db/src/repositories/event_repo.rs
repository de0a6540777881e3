//! Repository for events, likes and memberships.
//!
//! Reads go through the stored procedures returning flat join rows, which are
//! folded with [`mercuria_core::event_graph::aggregate`]: one query plus one
//! aggregation pass per request.

use indexmap::IndexMap;
use mercuria_core::event_graph::{aggregate, newest_first, Event, FlatRow, ScanError};
use mercuria_core::types::EntityId;
use sqlx::PgPool;

use crate::models::event::{CreateEvent, EventRow};

/// Failure of an aggregated event read.
#[derive(Debug, thiserror::Error)]
pub enum EventQueryError {
    #[error("event query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("event row scan failed: {0}")]
    Scan(#[from] ScanError),
}

/// Provides event reads and writes.
pub struct EventRepo;

impl EventRepo {
    /// All events, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Event>, EventQueryError> {
        let rows = sqlx::query_as::<_, EventRow>("SELECT * FROM public.get_events()")
            .fetch_all(pool)
            .await?;
        Ok(newest_first(fold(rows)?))
    }

    /// One event with its owner, likes, members and photos.
    pub async fn find_by_id(pool: &PgPool, id: EntityId) -> Result<Option<Event>, EventQueryError> {
        let rows = sqlx::query_as::<_, EventRow>("SELECT * FROM public.get_event($1)")
            .bind(id)
            .fetch_all(pool)
            .await?;
        let mut events = fold(rows)?;
        Ok(events.shift_remove(&id))
    }

    /// Events the user owns or is a member of, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: EntityId,
    ) -> Result<Vec<Event>, EventQueryError> {
        let rows = sqlx::query_as::<_, EventRow>("SELECT * FROM public.get_user_events($1)")
            .bind(user_id)
            .fetch_all(pool)
            .await?;
        Ok(newest_first(fold(rows)?))
    }

    /// Create an event, returning its id.
    pub async fn create(pool: &PgPool, input: &CreateEvent) -> Result<EntityId, sqlx::Error> {
        sqlx::query_scalar::<_, EntityId>("SELECT * FROM public.create_event($1, $2)")
            .bind(&input.name)
            .bind(input.owner)
            .fetch_one(pool)
            .await
    }

    /// Record that `user_id` likes `event_id`.
    pub async fn like(
        pool: &PgPool,
        user_id: EntityId,
        event_id: EntityId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO likes (user_id, event_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(event_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Remove a like. Returns the number of rows deleted.
    pub async fn dislike(
        pool: &PgPool,
        user_id: EntityId,
        event_id: EntityId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND event_id = $2")
            .bind(user_id)
            .bind(event_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Add a member to an event. Returns `false` if already a member.
    pub async fn add_member(
        pool: &PgPool,
        user_id: EntityId,
        event_id: EntityId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO event_members (user_id, event_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(event_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn fold(rows: Vec<EventRow>) -> Result<IndexMap<EntityId, Event>, ScanError> {
    let count = rows.len();
    let events = aggregate(rows.into_iter().map(FlatRow::try_from))?;
    tracing::debug!(rows = count, events = events.len(), "Aggregated event rows");
    Ok(events)
}
