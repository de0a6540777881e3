use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use mercuria_core::session_store::{StoreError, TokenStore};
use mercuria_core::types::{EntityId, SessionId};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Record {
    user_id: EntityId,
    expires_at: Instant,
}

impl Record {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-process [`TokenStore`] with per-record TTLs.
///
/// Expired records read as absent and are dropped lazily on access or by
/// [`MemoryTokenStore::purge_expired`].
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    records: DashMap<SessionId, Record>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records.
    pub fn live_count(&self) -> usize {
        let now = Instant::now();
        self.records.iter().filter(|r| r.is_live(now)).count()
    }

    /// Drop every expired record, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.records.len();
        self.records.retain(|_, record| record.is_live(now));
        before - self.records.len()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn put(
        &self,
        session_id: SessionId,
        user_id: EntityId,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let now = Instant::now();
        let record = Record {
            user_id,
            expires_at: now + ttl,
        };

        match self.records.entry(session_id) {
            Entry::Occupied(mut existing) => {
                if existing.get().is_live(now) {
                    return Err(StoreError::Collision(session_id));
                }
                existing.insert(record);
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
        Ok(())
    }

    async fn get(&self, session_id: SessionId) -> Result<Option<EntityId>, StoreError> {
        let now = Instant::now();
        let found = self.records.get(&session_id).map(|r| *r);

        match found {
            Some(record) if record.is_live(now) => Ok(Some(record.user_id)),
            Some(_) => {
                self.records
                    .remove_if(&session_id, |_, record| !record.is_live(now));
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, session_id: SessionId) -> Result<u64, StoreError> {
        let now = Instant::now();
        match self.records.remove(&session_id) {
            Some((_, record)) if record.is_live(now) => Ok(1),
            _ => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn put_then_get_returns_user() {
        let store = MemoryTokenStore::new();
        let (sid, uid) = (Uuid::new_v4(), Uuid::new_v4());

        store.put(sid, uid, TTL).await.unwrap();

        assert_eq!(store.get(sid).await.unwrap(), Some(uid));
        assert_eq!(store.get(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_reports_count() {
        let store = MemoryTokenStore::new();
        let sid = Uuid::new_v4();
        store.put(sid, Uuid::new_v4(), TTL).await.unwrap();

        assert_eq!(store.delete(sid).await.unwrap(), 1);
        assert_eq!(store.delete(sid).await.unwrap(), 0);
        assert_eq!(store.get(sid).await.unwrap(), None);
    }

    #[tokio::test]
    async fn live_id_cannot_be_reused() {
        let store = MemoryTokenStore::new();
        let sid = Uuid::new_v4();
        let owner = Uuid::new_v4();
        store.put(sid, owner, TTL).await.unwrap();

        let err = store.put(sid, Uuid::new_v4(), TTL).await.unwrap_err();

        assert!(matches!(err, StoreError::Collision(id) if id == sid));
        assert_eq!(store.get(sid).await.unwrap(), Some(owner));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_record_reads_as_absent() {
        let store = MemoryTokenStore::new();
        let sid = Uuid::new_v4();
        store.put(sid, Uuid::new_v4(), TTL).await.unwrap();

        tokio::time::advance(TTL + Duration::from_secs(1)).await;

        assert_eq!(store.get(sid).await.unwrap(), None);
        assert_eq!(store.delete(sid).await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn ttls_are_tracked_per_record() {
        let store = MemoryTokenStore::new();
        let short = Uuid::new_v4();
        let long = Uuid::new_v4();
        store.put(short, Uuid::new_v4(), Duration::from_secs(10)).await.unwrap();
        store.put(long, Uuid::new_v4(), Duration::from_secs(600)).await.unwrap();

        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(store.live_count(), 1);
        assert_eq!(store.purge_expired(), 1);
        assert!(store.get(long).await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_id_may_be_reissued() {
        let store = MemoryTokenStore::new();
        let sid = Uuid::new_v4();
        store.put(sid, Uuid::new_v4(), Duration::from_secs(1)).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;

        let next_owner = Uuid::new_v4();
        store.put(sid, next_owner, TTL).await.unwrap();
        assert_eq!(store.get(sid).await.unwrap(), Some(next_owner));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deletes_have_a_single_winner() {
        let store = Arc::new(MemoryTokenStore::new());
        let sid = Uuid::new_v4();
        store.put(sid, Uuid::new_v4(), TTL).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.delete(sid).await.unwrap() })
            })
            .collect();

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }
        assert_eq!(total, 1);
    }
}
