//! Shared response envelope types for API handlers.
//!
//! Successful payloads use a `{ "data": ... }` envelope; actions with nothing
//! to return use `{ "message": ... }`. Errors are rendered by
//! [`AppError`](crate::error::AppError).

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: events }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "message": "..." }` acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub const SUCCESS: Self = Self { message: "success" };
}
