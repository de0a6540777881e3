/// Users, events and photos are keyed by PostgreSQL UUIDs.
pub type EntityId = uuid::Uuid;

/// Likes use a SERIAL primary key.
pub type LikeId = i32;

/// Opaque identifier of one session record (one per issued token).
pub type SessionId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
