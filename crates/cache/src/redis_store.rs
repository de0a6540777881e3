use std::time::Duration;

use async_trait::async_trait;
use mercuria_core::session_store::{StoreError, TokenStore};
use mercuria_core::types::{EntityId, SessionId};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Default key namespace for session records.
pub const DEFAULT_KEY_PREFIX: &str = "session";

/// Session records as plain Redis strings: `{prefix}:{session_id}` -> user id.
#[derive(Clone)]
pub struct RedisTokenStore {
    connection: ConnectionManager,
    prefix: String,
}

impl RedisTokenStore {
    pub fn new(connection: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            connection,
            prefix: prefix.into(),
        }
    }

    fn key(&self, session_id: SessionId) -> String {
        format!("{}:{}", self.prefix, session_id)
    }
}

fn backend(err: redis::RedisError) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Redis rejects a zero `PX`; sub-millisecond TTLs round up.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn put(
        &self,
        session_id: SessionId,
        user_id: EntityId,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.key(session_id))
            .arg(user_id.to_string())
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(backend)?;

        match reply {
            Some(_) => Ok(()),
            None => Err(StoreError::Collision(session_id)),
        }
    }

    async fn get(&self, session_id: SessionId) -> Result<Option<EntityId>, StoreError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(self.key(session_id)).await.map_err(backend)?;

        value
            .map(|raw| {
                raw.parse().map_err(|_| StoreError::Malformed {
                    session_id,
                    value: raw,
                })
            })
            .transpose()
    }

    async fn delete(&self, session_id: SessionId) -> Result<u64, StoreError> {
        let mut conn = self.connection.clone();
        let removed: u64 = conn.del(self.key(session_id)).await.map_err(backend)?;
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
