//! Session-token generation and validation.
//!
//! Both halves of a session are HS256-signed JWTs carrying [`SessionClaims`].
//! Access and refresh tokens are signed with different secrets and tagged
//! with their [`TokenKind`], so one can never be presented as the other.
//! The `sid` claim names the server-side session record that makes the token
//! usable; `pair` names the record of the other half of the same pair.

use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mercuria_core::types::{EntityId, SessionId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which half of a session pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims embedded in every session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Subject -- the internal user id.
    pub sub: EntityId,
    /// Session record this token is bound to.
    pub sid: SessionId,
    /// Session record of the other token issued alongside this one.
    pub pair: SessionId,
    pub kind: TokenKind,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

/// Configuration for session-token signing and lifetimes.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret for access tokens.
    pub access_secret: String,
    /// HMAC-SHA256 secret for refresh tokens.
    pub refresh_secret: String,
    /// Access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
    /// Refresh token lifetime in days (default: 7).
    pub refresh_token_expiry_days: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
/// Default refresh token expiry in days.
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `JWT_SECRET_KEY`           | **yes**  | --      |
    /// | `REFRESH_SECRET`           | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `15`    |
    /// | `JWT_REFRESH_EXPIRY_DAYS`  | no       | `7`     |
    ///
    /// # Panics
    ///
    /// Panics if either secret is missing or empty, if both secrets are the
    /// same, or if an expiry is not a positive integer.
    pub fn from_env() -> Self {
        let access_secret = std::env::var("JWT_SECRET_KEY")
            .expect("JWT_SECRET_KEY must be set in the environment");
        assert!(!access_secret.is_empty(), "JWT_SECRET_KEY must not be empty");

        let refresh_secret = std::env::var("REFRESH_SECRET")
            .expect("REFRESH_SECRET must be set in the environment");
        assert!(!refresh_secret.is_empty(), "REFRESH_SECRET must not be empty");
        assert_ne!(
            access_secret, refresh_secret,
            "JWT_SECRET_KEY and REFRESH_SECRET must differ"
        );

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");
        assert!(access_token_expiry_mins > 0, "JWT_ACCESS_EXPIRY_MINS must be positive");

        let refresh_token_expiry_days: i64 = std::env::var("JWT_REFRESH_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_EXPIRY_DAYS.to_string())
            .parse()
            .expect("JWT_REFRESH_EXPIRY_DAYS must be a valid i64");
        assert!(refresh_token_expiry_days > 0, "JWT_REFRESH_EXPIRY_DAYS must be positive");

        Self {
            access_secret,
            refresh_secret,
            access_token_expiry_mins,
            refresh_token_expiry_days,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_expiry_mins.unsigned_abs() * 60)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_expiry_days.unsigned_abs() * 24 * 60 * 60)
    }

    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.access_secret.as_bytes(),
            TokenKind::Refresh => self.refresh_secret.as_bytes(),
        }
    }
}

/// A freshly signed access/refresh pair and the record ids they are bound to.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub access_session_id: SessionId,
    pub refresh_token: String,
    pub refresh_session_id: SessionId,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Why a presented token was not accepted.
#[derive(Debug, thiserror::Error)]
pub enum TokenRejected {
    /// Bad signature, malformed, or expired.
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("expected a {expected:?} token, got {actual:?}")]
    WrongKind { expected: TokenKind, actual: TokenKind },
}

/// Sign a new access/refresh pair for `user_id` with fresh session ids.
///
/// Nothing is persisted here; the caller owns writing both session records.
pub fn issue_token_pair(
    user_id: EntityId,
    config: &JwtConfig,
) -> Result<TokenPair, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let access_session_id = Uuid::new_v4();
    let refresh_session_id = Uuid::new_v4();

    let access = SessionClaims {
        sub: user_id,
        sid: access_session_id,
        pair: refresh_session_id,
        kind: TokenKind::Access,
        iat: now,
        exp: now + config.access_token_expiry_mins * 60,
    };
    let refresh = SessionClaims {
        sub: user_id,
        sid: refresh_session_id,
        pair: access_session_id,
        kind: TokenKind::Refresh,
        iat: now,
        exp: now + config.refresh_token_expiry_days * 24 * 60 * 60,
    };

    Ok(TokenPair {
        access_token: sign(&access, config)?,
        access_session_id,
        refresh_token: sign(&refresh, config)?,
        refresh_session_id,
        expires_in: config.access_token_expiry_mins * 60,
    })
}

fn sign(claims: &SessionClaims, config: &JwtConfig) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(config.secret(claims.kind)),
    )
}

/// Validate a token of the given kind and return its claims.
///
/// Checks the signature against that kind's secret, the expiry, and the
/// embedded `kind` tag. Session-record liveness is not checked here.
pub fn validate_token(
    token: &str,
    kind: TokenKind,
    config: &JwtConfig,
) -> Result<SessionClaims, TokenRejected> {
    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config.secret(kind)),
        &Validation::new(Algorithm::HS256),
    )?;

    let claims = token_data.claims;
    if claims.kind != kind {
        return Err(TokenRejected::WrongKind {
            expected: kind,
            actual: claims.kind,
        });
    }
    Ok(claims)
}
