//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument.

pub mod event_repo;
pub mod photo_repo;
pub mod user_repo;

pub use event_repo::{EventQueryError, EventRepo};
pub use photo_repo::PhotoRepo;
pub use user_repo::UserRepo;
