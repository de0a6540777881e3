//! Session lifecycle: login, refresh, logout and per-request authentication.
//!
//! A session is an access/refresh token pair plus one store record per
//! token. A token is usable only while its record is live, so deleting a
//! record revokes the token immediately regardless of the JWT expiry.
//! Refresh deletes the refresh record before issuing a new pair, which makes
//! each refresh token single-use even under concurrent requests: the store
//! guarantees only one delete of a live record observes a count of 1.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use mercuria_core::identity::{
    ClaimError, ClaimVerifier, DirectoryError, DirectoryUser, IdentityClaim, Provider,
    UserDirectory,
};
use mercuria_core::session_store::{StoreError, TokenStore};
use mercuria_core::types::{EntityId, SessionId};

use crate::auth::jwt::{issue_token_pair, validate_token, JwtConfig, TokenKind, TokenPair};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("identity provider '{0}' is not enabled")]
    UnknownProvider(Provider),

    #[error(transparent)]
    Claim(#[from] ClaimError),

    /// Malformed, forged, expired, wrong-kind, or already-consumed token.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The token is well-formed but its session record is gone.
    #[error("session is not active")]
    InvalidSession,

    #[error("token signing failed: {0}")]
    TokenIssue(#[source] jsonwebtoken::errors::Error),

    /// A new session record could not be written.
    #[error("session could not be saved: {0}")]
    Persist(#[source] StoreError),

    #[error("session store failure: {0}")]
    Store(#[source] StoreError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: DirectoryUser,
    pub tokens: TokenPair,
}

/// The identity behind a live access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: EntityId,
    pub session_id: SessionId,
}

pub struct SessionManager {
    store: Arc<dyn TokenStore>,
    directory: Arc<dyn UserDirectory>,
    verifiers: HashMap<Provider, Arc<dyn ClaimVerifier>>,
    jwt: JwtConfig,
    call_timeout: Duration,
}

impl SessionManager {
    /// Build a manager with no identity providers enabled.
    ///
    /// `call_timeout` bounds every call to the store, the directory and the
    /// provider verifiers.
    pub fn new(
        store: Arc<dyn TokenStore>,
        directory: Arc<dyn UserDirectory>,
        jwt: JwtConfig,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            directory,
            verifiers: HashMap::new(),
            jwt,
            call_timeout,
        }
    }

    pub fn with_verifier(mut self, provider: Provider, verifier: Arc<dyn ClaimVerifier>) -> Self {
        self.verifiers.insert(provider, verifier);
        self
    }

    /// Round-trip to the token store.
    pub async fn store_healthy(&self) -> bool {
        matches!(self.bounded("token store", self.store.ping()).await, Ok(Ok(())))
    }

    /// Verify a provider token with that provider's verifier.
    pub async fn verify_claim(
        &self,
        provider: Provider,
        provider_token: &str,
    ) -> Result<IdentityClaim, SessionError> {
        let verifier = self
            .verifiers
            .get(&provider)
            .ok_or(SessionError::UnknownProvider(provider))?;

        let claim = self
            .bounded("identity provider", verifier.verify(provider_token))
            .await?
            .inspect_err(|e| tracing::info!(%provider, error = %e, "Provider token rejected"))?;
        Ok(claim)
    }

    /// Resolve the claim to an internal user and open a new session for them.
    pub async fn login(&self, claim: &IdentityClaim) -> Result<LoginOutcome, SessionError> {
        let user = self
            .bounded("user directory", self.directory.get_or_create_user(claim))
            .await??;

        let tokens = self.issue(user.id).await?;
        tracing::info!(
            user_id = %user.id,
            session_id = %tokens.access_session_id,
            "Session opened",
        );
        Ok(LoginOutcome { user, tokens })
    }

    /// Consume a refresh token and issue a replacement pair for the same user.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        let claims = validate_token(refresh_token, TokenKind::Refresh, &self.jwt)
            .map_err(|e| SessionError::InvalidToken(e.to_string()))?;

        let removed = self
            .bounded("token store", self.store.delete(claims.sid))
            .await?
            .map_err(SessionError::Store)?;
        if removed == 0 {
            tracing::warn!(
                user_id = %claims.sub,
                session_id = %claims.sid,
                "Refresh token reused or revoked",
            );
            return Err(SessionError::InvalidToken(
                "refresh token has already been used or revoked".into(),
            ));
        }

        let tokens = self.issue(claims.sub).await?;
        tracing::info!(
            user_id = %claims.sub,
            session_id = %tokens.access_session_id,
            "Session refreshed",
        );
        Ok(tokens)
    }

    /// Revoke the access session and, best-effort, its paired refresh session.
    pub async fn logout(&self, access_token: &str) -> Result<(), SessionError> {
        let claims = validate_token(access_token, TokenKind::Access, &self.jwt)
            .map_err(|e| SessionError::InvalidToken(e.to_string()))?;

        let removed = self
            .bounded("token store", self.store.delete(claims.sid))
            .await?
            .map_err(SessionError::Store)?;
        if removed == 0 {
            return Err(SessionError::InvalidSession);
        }

        self.discard(claims.pair).await;
        tracing::info!(user_id = %claims.sub, session_id = %claims.sid, "Session closed");
        Ok(())
    }

    /// Resolve an access token to a live session.
    pub async fn authenticate(&self, access_token: &str) -> Result<AuthSession, SessionError> {
        let claims = validate_token(access_token, TokenKind::Access, &self.jwt)
            .map_err(|e| SessionError::InvalidToken(e.to_string()))?;

        let owner = self
            .bounded("token store", self.store.get(claims.sid))
            .await?
            .map_err(SessionError::Store)?;

        match owner {
            Some(user_id) if user_id == claims.sub => Ok(AuthSession {
                user_id,
                session_id: claims.sid,
            }),
            Some(other) => {
                tracing::warn!(
                    session_id = %claims.sid,
                    token_user = %claims.sub,
                    record_user = %other,
                    "Session record belongs to another user",
                );
                Err(SessionError::InvalidSession)
            }
            None => Err(SessionError::InvalidSession),
        }
    }

    /// Sign a pair and write both records. If the second write fails the
    /// first record is deleted again, so no half-issued session stays live.
    async fn issue(&self, user_id: EntityId) -> Result<TokenPair, SessionError> {
        let tokens = issue_token_pair(user_id, &self.jwt).map_err(SessionError::TokenIssue)?;

        self.persist(tokens.access_session_id, user_id, self.jwt.access_ttl())
            .await?;
        if let Err(err) = self
            .persist(tokens.refresh_session_id, user_id, self.jwt.refresh_ttl())
            .await
        {
            self.discard(tokens.access_session_id).await;
            return Err(err);
        }
        Ok(tokens)
    }

    async fn persist(
        &self,
        session_id: SessionId,
        user_id: EntityId,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        self.bounded("token store", self.store.put(session_id, user_id, ttl))
            .await?
            .map_err(|e| {
                tracing::error!(%session_id, error = %e, "Failed to save session record");
                SessionError::Persist(e)
            })
    }

    async fn discard(&self, session_id: SessionId) {
        match self
            .bounded("token store", self.store.delete(session_id))
            .await
        {
            Ok(Ok(removed)) => tracing::debug!(%session_id, removed, "Discarded session record"),
            Ok(Err(e)) => {
                tracing::warn!(%session_id, error = %e, "Failed to discard session record")
            }
            Err(_) => tracing::warn!(%session_id, "Timed out discarding session record"),
        }
    }

    async fn bounded<F, T, E>(
        &self,
        dependency: &'static str,
        call: F,
    ) -> Result<Result<T, E>, SessionError>
    where
        F: Future<Output = Result<T, E>>,
    {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| {
                tracing::warn!(
                    dependency,
                    timeout_ms = self.call_timeout.as_millis() as u64,
                    "Call timed out",
                );
                SessionError::Timeout(dependency)
            })
    }
}
