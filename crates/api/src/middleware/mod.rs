//! Authentication extractors.
//!
//! - [`auth::AuthUser`] -- resolves a Bearer access token to a live session.

pub mod auth;
