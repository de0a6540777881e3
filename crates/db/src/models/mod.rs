//! Row models and DTOs.
//!
//! Each submodule contains `FromRow` structs matching what the queries return
//! and `Deserialize` DTOs for inserts. Conversion into the domain types of
//! `mercuria_core` happens here, next to the rows.

pub mod event;
pub mod photo;
pub mod user;
