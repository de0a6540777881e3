//! Domain types and pure logic for the Mercuria event-sharing backend.
//!
//! Nothing in this crate performs I/O. The seams to external systems
//! ([`session_store::TokenStore`], [`identity::ClaimVerifier`],
//! [`identity::UserDirectory`], [`storage::ObjectStorage`]) are traits that
//! the `db`, `cache`, `storage` and `api` crates implement.

pub mod error;
pub mod event_graph;
pub mod identity;
pub mod session_store;
pub mod storage;
pub mod types;
pub mod validation;
