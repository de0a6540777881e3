//! Identity-provider token verification against published JWKS keys.
//!
//! Google and Apple both sign their ID tokens with rotating RS256 keys
//! published as a JWK set. [`JwksClaimVerifier`] caches the set, refetching
//! when it goes stale or when a token names a key id it has not seen.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use mercuria_core::identity::{ClaimError, ClaimVerifier, IdentityClaim, Provider};
use serde::Deserialize;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::config::ProvidersConfig;

const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

const APPLE_JWKS_URL: &str = "https://appleid.apple.com/auth/keys";
const APPLE_ISSUER: &str = "https://appleid.apple.com";

/// An unknown key id never triggers more than one refetch per this interval.
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(30);

/// Where a provider publishes its keys and what its tokens must claim.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub jwks_url: String,
    /// Accepted `iss` values.
    pub issuers: Vec<String>,
    /// Required `aud` value. `None` skips the audience check.
    pub audience: Option<String>,
    pub key_cache_ttl: Duration,
}

impl ProviderConfig {
    pub fn google(client_id: Option<String>, key_cache_ttl: Duration) -> Self {
        Self {
            provider: Provider::Google,
            jwks_url: GOOGLE_JWKS_URL.to_string(),
            issuers: GOOGLE_ISSUERS.iter().map(|s| s.to_string()).collect(),
            audience: client_id,
            key_cache_ttl,
        }
    }

    pub fn apple(client_id: String, key_cache_ttl: Duration) -> Self {
        Self {
            provider: Provider::Apple,
            jwks_url: APPLE_JWKS_URL.to_string(),
            issuers: vec![APPLE_ISSUER.to_string()],
            audience: Some(client_id),
            key_cache_ttl,
        }
    }
}

/// Claims read from a provider ID token. Apple omits `name` and `picture`.
#[derive(Debug, Deserialize)]
struct ProviderClaims {
    sub: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    picture: String,
    #[serde(default)]
    email: String,
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

pub struct JwksClaimVerifier {
    config: ProviderConfig,
    /// `None` pins the verifier to the keys it was built with.
    http: Option<reqwest::Client>,
    cache: RwLock<Option<CachedKeys>>,
}

impl JwksClaimVerifier {
    pub fn new(config: ProviderConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            http: Some(http),
            cache: RwLock::new(None),
        }
    }

    /// A verifier that never goes to the network.
    pub fn with_static_keys(config: ProviderConfig, keys: JwkSet) -> Self {
        Self {
            config,
            http: None,
            cache: RwLock::new(Some(CachedKeys {
                keys,
                fetched_at: Instant::now(),
            })),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&self.config.issuers);
        match &self.config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        validation
    }

    async fn key_for(&self, kid: &str) -> Result<Jwk, ClaimError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                let fresh = cached.fetched_at.elapsed() < self.config.key_cache_ttl;
                if let Some(jwk) = cached.keys.find(kid) {
                    if fresh || self.http.is_none() {
                        return Ok(jwk.clone());
                    }
                } else if cached.fetched_at.elapsed() < MIN_REFETCH_INTERVAL {
                    return Err(unknown_key(kid));
                }
            }
        }

        let Some(http) = &self.http else {
            return Err(unknown_key(kid));
        };

        let keys = self.fetch_keys(http).await?;
        let jwk = keys.find(kid).cloned();
        *self.cache.write().await = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });
        jwk.ok_or_else(|| unknown_key(kid))
    }

    async fn fetch_keys(&self, http: &reqwest::Client) -> Result<JwkSet, ClaimError> {
        let unavailable = |e: reqwest::Error| {
            tracing::warn!(
                provider = %self.config.provider,
                url = %self.config.jwks_url,
                error = %e,
                "Failed to fetch provider signing keys",
            );
            ClaimError::Unavailable(format!("{} signing keys: {e}", self.config.provider))
        };

        let keys = http
            .get(&self.config.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(unavailable)?
            .json::<JwkSet>()
            .await
            .map_err(unavailable)?;

        tracing::debug!(
            provider = %self.config.provider,
            key_count = keys.keys.len(),
            "Refreshed provider signing keys",
        );
        Ok(keys)
    }
}

fn unknown_key(kid: &str) -> ClaimError {
    ClaimError::Invalid(format!("unknown signing key '{kid}'"))
}

#[async_trait]
impl ClaimVerifier for JwksClaimVerifier {
    async fn verify(&self, provider_token: &str) -> Result<IdentityClaim, ClaimError> {
        let header =
            decode_header(provider_token).map_err(|e| ClaimError::Invalid(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| ClaimError::Invalid("token header has no key id".into()))?;

        let jwk = self.key_for(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk)
            .map_err(|e| ClaimError::Unavailable(format!("unusable signing key '{kid}': {e}")))?;

        let data = decode::<ProviderClaims>(provider_token, &key, &self.validation())
            .map_err(|e| ClaimError::Invalid(e.to_string()))?;

        Ok(IdentityClaim {
            subject: data.claims.sub,
            name: data.claims.name,
            avatar_url: data.claims.picture,
            email: data.claims.email,
        })
    }
}

/// Build one verifier per enabled provider.
///
/// Google is always enabled; Apple only when a client id is configured.
pub fn verifiers_from_config(
    config: &ProvidersConfig,
    http: reqwest::Client,
) -> Vec<(Provider, Arc<dyn ClaimVerifier>)> {
    let ttl = Duration::from_secs(config.key_cache_ttl_secs);
    let mut verifiers: Vec<(Provider, Arc<dyn ClaimVerifier>)> = vec![(
        Provider::Google,
        Arc::new(JwksClaimVerifier::new(
            ProviderConfig::google(config.google_client_id.clone(), ttl),
            http.clone(),
        )),
    )];

    if let Some(client_id) = &config.apple_client_id {
        verifiers.push((
            Provider::Apple,
            Arc::new(JwksClaimVerifier::new(
                ProviderConfig::apple(client_id.clone(), ttl),
                http,
            )),
        ));
    }
    verifiers
}
