//! Expiring session-record storage.
//!
//! A session record maps one [`SessionId`] to the user it was issued for and
//! lives until it is deleted or its TTL elapses. Expiry is enforced by the
//! backing store; a record whose TTL has elapsed must read as absent even if
//! the backend has not purged it yet.

use std::time::Duration;

use async_trait::async_trait;

use crate::types::{EntityId, SessionId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or rejected the command.
    #[error("session store backend failure: {0}")]
    Backend(String),

    /// A live record already exists under this id.
    #[error("session id {0} is already in use")]
    Collision(SessionId),

    /// The stored value is not a user id.
    #[error("session {session_id} holds a malformed value: {value}")]
    Malformed { session_id: SessionId, value: String },
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Create a record. Fails with [`StoreError::Collision`] if a live record
    /// with the same id exists; existing records are never overwritten.
    async fn put(
        &self,
        session_id: SessionId,
        user_id: EntityId,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Look up a live record. `Ok(None)` means absent or expired.
    async fn get(&self, session_id: SessionId) -> Result<Option<EntityId>, StoreError>;

    /// Remove a record, returning how many live records were removed (0 or 1).
    ///
    /// Per-key deletion is atomic: of two concurrent deletes of the same live
    /// record, exactly one observes 1.
    async fn delete(&self, session_id: SessionId) -> Result<u64, StoreError>;

    /// Round-trip to the backend.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
