//! Photo rows and DTOs.

use mercuria_core::event_graph::Photo;
use mercuria_core::types::{EntityId, Timestamp};
use sqlx::FromRow;

/// A row from the `photos` table.
#[derive(Debug, Clone, FromRow)]
pub struct PhotoRow {
    pub id: EntityId,
    pub public_url: String,
    pub file_name: String,
    pub file_type: String,
    pub created_by: EntityId,
    pub event_id: EntityId,
    pub created_at: Timestamp,
}

impl From<PhotoRow> for Photo {
    fn from(row: PhotoRow) -> Self {
        Self {
            id: row.id,
            public_url: row.public_url,
            file_name: row.file_name,
            file_type: row.file_type,
            created_by: row.created_by,
            event_id: row.event_id,
            created_at: row.created_at,
        }
    }
}

/// DTO for inserting an uploaded photo.
#[derive(Debug, Clone)]
pub struct CreatePhoto {
    /// Also the object-storage key.
    pub id: EntityId,
    pub public_url: String,
    pub file_name: String,
    pub file_type: String,
    pub created_by: EntityId,
    pub event_id: EntityId,
}
