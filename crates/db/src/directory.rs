//! [`UserDirectory`] backed by PostgreSQL.

use async_trait::async_trait;
use mercuria_core::identity::{DirectoryError, DirectoryUser, IdentityClaim, UserDirectory};

use crate::repositories::UserRepo;
use crate::DbPool;

#[derive(Clone)]
pub struct PgUserDirectory {
    pool: DbPool,
}

impl PgUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn get_or_create_user(
        &self,
        claim: &IdentityClaim,
    ) -> Result<DirectoryUser, DirectoryError> {
        UserRepo::get_or_create(&self.pool, claim)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "get_or_create_user failed");
                DirectoryError::Backend(e.to_string())
            })
    }
}
