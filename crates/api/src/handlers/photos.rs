//! Photo upload for `/events/upload-photos`.

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::Json;
use mercuria_core::event_graph::Photo;
use mercuria_core::storage::validate_photo_type;
use mercuria_core::types::EntityId;
use mercuria_core::validation::parse_entity_id;
use mercuria_db::models::photo::CreatePhoto;
use mercuria_db::repositories::PhotoRepo;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::bounded;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// A file part read from the form, not yet stored.
struct PendingPhoto {
    file_name: String,
    file_type: String,
    data: Vec<u8>,
}

/// The form split by field. Field names may carry a `[]` suffix.
#[derive(Default)]
struct UploadForm {
    photos: Vec<PendingPhoto>,
    created_by: Vec<String>,
    event_ids: Vec<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().trim_end_matches("[]").to_string();
            match name.as_str() {
                "photos" => {
                    let file_name = field.file_name().unwrap_or("photo").to_string();
                    let file_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let data = field.bytes().await?.to_vec();
                    form.photos.push(PendingPhoto {
                        file_name,
                        file_type,
                        data,
                    });
                }
                "created_by" => form.created_by.push(field.text().await?),
                "event_id" => form.event_ids.push(field.text().await?),
                other => tracing::debug!(field = other, "Ignoring unknown upload field"),
            }
        }
        Ok(form)
    }

    /// Pair each photo with its uploader and event by position.
    ///
    /// Every photo is checked before any is stored, so a bad part rejects
    /// the whole request.
    fn into_uploads(self) -> AppResult<Vec<(PendingPhoto, EntityId, EntityId)>> {
        if self.created_by.is_empty() || self.event_ids.is_empty() {
            return Err(AppError::BadRequest(
                "Required `created_by` and `event_id`".into(),
            ));
        }
        if self.photos.is_empty() {
            return Err(AppError::BadRequest("Required `photos`".into()));
        }

        self.photos
            .into_iter()
            .enumerate()
            .map(|(i, photo)| {
                let (Some(created_by), Some(event_id)) =
                    (self.created_by.get(i), self.event_ids.get(i))
                else {
                    return Err(AppError::BadRequest(format!(
                        "Photo {i} has no matching `created_by` and `event_id`"
                    )));
                };
                validate_photo_type(&photo.file_type)?;
                let created_by = parse_entity_id("created_by", created_by)?;
                let event_id = parse_entity_id("event_id", event_id)?;
                Ok((photo, created_by, event_id))
            })
            .collect()
    }
}

/// POST /api/v1/events/upload-photos
///
/// Each photo is stored under a fresh time-ordered id, which is both the
/// object key and the photo row id. Photos are stored one at a time and
/// stored photos are not rolled back: if a later photo fails, the error
/// lists the ids already saved in `details`.
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<DataResponse<Vec<Photo>>>> {
    let uploads = UploadForm::read(multipart?).await?.into_uploads()?;

    let mut stored: Vec<Photo> = Vec::with_capacity(uploads.len());
    for (pending, created_by, event_id) in uploads {
        match store_photo(&state, pending, created_by, event_id).await {
            Ok(photo) => {
                tracing::info!(
                    photo_id = %photo.id,
                    %event_id,
                    uploaded_by = %user.user_id,
                    "Photo stored",
                );
                stored.push(photo);
            }
            Err(err) if stored.is_empty() => return Err(err),
            Err(err) => {
                tracing::warn!(stored = stored.len(), error = %err, "Photo batch stopped partway");
                return Err(AppError::PartialUpload {
                    stored: stored.into_iter().map(|p| p.id).collect(),
                    source: Box::new(err),
                });
            }
        }
    }

    Ok(Json(DataResponse { data: stored }))
}

/// Write one object, then its row.
async fn store_photo(
    state: &AppState,
    pending: PendingPhoto,
    created_by: EntityId,
    event_id: EntityId,
) -> AppResult<Photo> {
    let id = Uuid::now_v7();
    let size = pending.data.len();

    let public_url = bounded(
        state,
        "object storage",
        state.storage.upload(pending.data, id, &pending.file_type),
    )
    .await?;

    let input = CreatePhoto {
        id,
        public_url,
        file_name: pending.file_name,
        file_type: pending.file_type,
        created_by,
        event_id,
    };
    bounded(state, "database", PhotoRepo::create(&state.pool, &input))
        .await
        .inspect_err(|_| tracing::warn!(photo_id = %id, size, "Object stored without a photo row"))
}
