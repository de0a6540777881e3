//! Repository for the `photos` table.

use mercuria_core::event_graph::Photo;
use sqlx::PgPool;

use crate::models::photo::{CreatePhoto, PhotoRow};

const COLUMNS: &str = "id, public_url, file_name, file_type, created_by, event_id, created_at";

pub struct PhotoRepo;

impl PhotoRepo {
    /// Insert an uploaded photo, returning the stored row.
    pub async fn create(pool: &PgPool, input: &CreatePhoto) -> Result<Photo, sqlx::Error> {
        let query = format!(
            "INSERT INTO photos (id, public_url, file_name, file_type, created_by, event_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, PhotoRow>(&query)
            .bind(input.id)
            .bind(&input.public_url)
            .bind(&input.file_name)
            .bind(&input.file_type)
            .bind(input.created_by)
            .bind(input.event_id)
            .fetch_one(pool)
            .await?;
        Ok(row.into())
    }
}
