//! HTTP API for Mercuria: provider sign-in, session tokens, events, likes,
//! invites and photo uploads.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
