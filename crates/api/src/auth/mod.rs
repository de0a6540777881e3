//! Authentication primitives.
//!
//! - [`jwt`] -- session-token signing and validation.
//! - [`provider`] -- Google/Apple ID-token verification.
//! - [`session`] -- the login/refresh/logout/authenticate lifecycle.

pub mod jwt;
pub mod provider;
pub mod session;
