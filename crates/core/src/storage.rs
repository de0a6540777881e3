//! Photo storage seam, content-type rules, and object-key helpers.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::EntityId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Content types accepted for event photos.
pub const ALLOWED_PHOTO_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// Default upper bound for one upload request body (20 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Seam
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("object storage upload failed: {0}")]
    Backend(String),
}

/// Write-once object storage returning a public URL per object.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `data` under `object_id` and return the object's public URL.
    async fn upload(
        &self,
        data: Vec<u8>,
        object_id: EntityId,
        content_type: &str,
    ) -> Result<String, UploadError>;
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate that `content_type` is an accepted photo type.
///
/// Parameters such as `; charset=...` are ignored.
pub fn validate_photo_type(content_type: &str) -> Result<(), CoreError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if ALLOWED_PHOTO_TYPES.contains(&essence.as_str()) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unsupported photo type '{content_type}'. Must be one of: {ALLOWED_PHOTO_TYPES:?}"
        )))
    }
}

/// Join a public base URL and an object key without doubling slashes.
pub fn public_url(base_url: &str, key: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}
