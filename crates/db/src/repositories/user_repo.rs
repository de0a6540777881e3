//! Repository for users.

use mercuria_core::identity::{DirectoryUser, IdentityClaim};
use sqlx::PgPool;

use crate::models::user::ResolvedUser;

pub struct UserRepo;

impl UserRepo {
    /// Resolve the account for a provider identity, creating it on first
    /// sign-in.
    pub async fn get_or_create(
        pool: &PgPool,
        claim: &IdentityClaim,
    ) -> Result<DirectoryUser, sqlx::Error> {
        let row = sqlx::query_as::<_, ResolvedUser>(
            "SELECT * FROM public.get_or_create_user($1, $2, $3, $4)",
        )
        .bind(&claim.subject)
        .bind(&claim.name)
        .bind(&claim.avatar_url)
        .bind(&claim.email)
        .fetch_one(pool)
        .await?;
        Ok(row.into())
    }
}
