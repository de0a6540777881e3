//! Session-record stores for the Mercuria backend.
//!
//! - [`RedisTokenStore`] -- production store; expiry is Redis's own `PX` TTL.
//! - [`MemoryTokenStore`] -- in-process store for tests and single-node
//!   development.

use redis::aio::ConnectionManager;

pub mod memory_store;
pub mod redis_store;

pub use memory_store::MemoryTokenStore;
pub use redis_store::RedisTokenStore;

/// Open a Redis client and wrap it in a shared, auto-reconnecting connection.
pub async fn connect(redis_url: &str) -> Result<ConnectionManager, redis::RedisError> {
    let client = redis::Client::open(redis_url)?;
    client.get_connection_manager().await
}

/// Build a `redis://` URL from host, optional password and database index.
pub fn redis_url_from_parts(host: &str, password: Option<&str>, db: u32) -> String {
    match password.filter(|p| !p.is_empty()) {
        Some(password) => format!("redis://:{password}@{host}/{db}"),
        None => format!("redis://{host}/{db}"),
    }
}
