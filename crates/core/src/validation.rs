//! Request-field validation shared by the HTTP handlers.

use crate::error::CoreError;
use crate::types::EntityId;

/// Ensure a required string field is present and non-blank.
pub fn require_field(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("`{field}` is required")));
    }
    Ok(())
}

/// Parse a required UUID field.
pub fn parse_entity_id(field: &str, value: &str) -> Result<EntityId, CoreError> {
    require_field(field, value)?;
    value
        .trim()
        .parse()
        .map_err(|_| CoreError::Validation(format!("`{field}` must be a UUID")))
}
