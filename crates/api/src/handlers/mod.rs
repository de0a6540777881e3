//! Request handlers, one module per resource.

pub mod auth;
pub mod events;
pub mod photos;

use std::future::Future;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Await `call` for at most the configured external-call timeout.
pub(crate) async fn bounded<F, T, E>(
    state: &AppState,
    dependency: &'static str,
    call: F,
) -> AppResult<T>
where
    F: Future<Output = Result<T, E>>,
    AppError: From<E>,
{
    match tokio::time::timeout(state.config.call_timeout(), call).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => {
            tracing::warn!(dependency, "Call timed out");
            Err(AppError::Timeout(dependency))
        }
    }
}
