//! User rows.

use mercuria_core::identity::DirectoryUser;
use mercuria_core::types::EntityId;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

/// Row returned by `get_or_create_user($1, $2, $3, $4)`: `id, name,
/// avatar_url` by position.
#[derive(Debug, Clone)]
pub struct ResolvedUser {
    pub id: EntityId,
    pub name: String,
    pub avatar_url: String,
}

impl<'r> FromRow<'r, PgRow> for ResolvedUser {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get(0)?,
            name: row.try_get(1)?,
            avatar_url: row.try_get(2)?,
        })
    }
}

impl From<ResolvedUser> for DirectoryUser {
    fn from(row: ResolvedUser) -> Self {
        Self {
            id: row.id,
            name: row.name,
            avatar_url: row.avatar_url,
        }
    }
}
