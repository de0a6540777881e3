//! Identity-provider claims and the seams that consume them.
//!
//! - [`ClaimVerifier`] -- turns a raw provider token into an [`IdentityClaim`].
//! - [`UserDirectory`] -- maps a claim to a stable internal [`DirectoryUser`].

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::EntityId;

/// Identity providers users can sign in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Google,
    Apple,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Apple => "apple",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "apple" => Ok(Self::Apple),
            other => Err(format!("Unknown identity provider '{other}'")),
        }
    }
}

/// Normalized identity attributes from a verified provider token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    /// Provider-scoped opaque subject.
    pub subject: String,
    pub name: String,
    pub avatar_url: String,
    pub email: String,
}

/// The internal account a claim resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: EntityId,
    pub name: String,
    pub avatar_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    /// The token is malformed, forged, expired, or issued for someone else.
    #[error("provider token rejected: {0}")]
    Invalid(String),

    /// The provider's signing keys could not be obtained.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("user directory failure: {0}")]
    Backend(String),
}

/// Verifies one provider's tokens.
#[async_trait]
pub trait ClaimVerifier: Send + Sync {
    async fn verify(&self, provider_token: &str) -> Result<IdentityClaim, ClaimError>;
}

/// Resolves (or creates) the internal user behind a claim.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_or_create_user(
        &self,
        claim: &IdentityClaim,
    ) -> Result<DirectoryUser, DirectoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("google".parse::<Provider>(), Ok(Provider::Google));
        assert_eq!("Apple".parse::<Provider>(), Ok(Provider::Apple));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = "github".parse::<Provider>().unwrap_err();
        assert!(err.contains("github"));
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(Provider::Google.to_string(), "google");
        assert_eq!(Provider::Apple.to_string(), "apple");
    }
}
