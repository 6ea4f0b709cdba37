/// Bearer-token verification
///
/// Production tokens are RS256 ID tokens from the managed identity provider,
/// checked against the provider's published JWK set. Local development and
/// tests use HS256 tokens signed with a shared secret.
use crate::config::IdentitySettings;
use crate::error::{Result as ServerResult, ServerError};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, jwk::JwkSet, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

/// Issuer prefix of managed-provider ID tokens
pub const MANAGED_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Issuer of shared-secret development tokens
pub const SHARED_SECRET_ISSUER: &str = "bloodbridge";

/// Unknown `kid`s do not trigger a key refetch more often than this
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(30);

/// Principal extracted from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub subject: String,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token rejected: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("Unknown signing key: {0}")]
    UnknownKey(String),

    #[error("Token carries no email claim")]
    MissingEmail,

    #[error("Signing keys unavailable: {0}")]
    KeyFetch(String),

    #[error("Token lifetime out of range")]
    Lifetime,
}

pub type Result<T> = std::result::Result<T, IdentityError>;

/// Turns a bearer token into a verified principal.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity>;
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

fn identity_from_claims(claims: IdTokenClaims) -> Result<VerifiedIdentity> {
    match claims.email {
        Some(email) if !email.trim().is_empty() => Ok(VerifiedIdentity {
            subject: claims.sub,
            email,
        }),
        _ => Err(IdentityError::MissingEmail),
    }
}

// =============================================================================
// Managed identity provider (RS256 + JWK set)
// =============================================================================

struct KeyCache {
    keys: JwkSet,
    fetched_at: Option<Instant>,
}

/// Verifies ID tokens issued by the managed identity provider.
pub struct ManagedIdentityVerifier {
    project_id: String,
    issuer: String,
    jwks_url: Option<String>,
    cache_ttl: Duration,
    http: reqwest::Client,
    cache: RwLock<KeyCache>,
}

impl ManagedIdentityVerifier {
    /// Verifier that fetches signing keys from `jwks_url`.
    pub fn new(
        project_id: impl Into<String>,
        jwks_url: impl Into<String>,
        cache_ttl: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| IdentityError::KeyFetch(e.to_string()))?;

        let project_id = project_id.into();
        Ok(Self {
            issuer: format!("{}{}", MANAGED_ISSUER_PREFIX, project_id),
            project_id,
            jwks_url: Some(jwks_url.into()),
            cache_ttl,
            http,
            cache: RwLock::new(KeyCache {
                keys: JwkSet { keys: Vec::new() },
                fetched_at: None,
            }),
        })
    }

    /// Verifier with a fixed key set that is never refetched.
    pub fn with_static_keys(project_id: impl Into<String>, keys: JwkSet) -> Self {
        let project_id = project_id.into();
        Self {
            issuer: format!("{}{}", MANAGED_ISSUER_PREFIX, project_id),
            project_id,
            jwks_url: None,
            cache_ttl: Duration::MAX,
            http: reqwest::Client::new(),
            cache: RwLock::new(KeyCache {
                keys,
                fetched_at: Some(Instant::now()),
            }),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Decoding key for `kid`, refreshing the cached key set when it is stale
    /// or does not know `kid`.
    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey> {
        {
            let cache = self.cache.read().await;
            let fresh = cache
                .fetched_at
                .is_some_and(|at| at.elapsed() < self.cache_ttl);
            if fresh {
                if let Some(jwk) = cache.keys.find(kid) {
                    return Ok(DecodingKey::from_jwk(jwk)?);
                }
            }
        }

        let Some(url) = self.jwks_url.as_deref() else {
            return Err(IdentityError::UnknownKey(kid.to_string()));
        };

        let mut cache = self.cache.write().await;

        // Another request may have refreshed while we waited for the lock
        let needs_fetch = match cache.fetched_at {
            None => true,
            Some(at) => {
                let age = at.elapsed();
                age >= self.cache_ttl
                    || (cache.keys.find(kid).is_none() && age >= MIN_REFETCH_INTERVAL)
            }
        };
        if needs_fetch {
            cache.keys = self.fetch_keys(url).await?;
            cache.fetched_at = Some(Instant::now());
        }

        let jwk = cache
            .keys
            .find(kid)
            .ok_or_else(|| IdentityError::UnknownKey(kid.to_string()))?;
        Ok(DecodingKey::from_jwk(jwk)?)
    }

    async fn fetch_keys(&self, url: &str) -> Result<JwkSet> {
        tracing::debug!(url = %url, "Fetching identity provider signing keys");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| IdentityError::KeyFetch(e.to_string()))?;

        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| IdentityError::KeyFetch(format!("invalid key set: {}", e)))?;

        tracing::info!(count = keys.keys.len(), "Identity provider signing keys refreshed");
        Ok(keys)
    }
}

#[async_trait]
impl IdentityVerifier for ManagedIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity> {
        let header = decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(IdentityError::Malformed(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::Malformed("missing key id".to_string()))?;

        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);

        let data = decode::<IdTokenClaims>(token, &key, &validation)?;
        identity_from_claims(data.claims)
    }
}

// =============================================================================
// Shared secret (HS256), for development and tests
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct SharedSecretClaims {
    sub: String,
    email: String,
    iss: String,
    iat: i64,
    exp: i64,
}

/// Verifies, and mints, HS256 tokens signed with a shared secret.
#[derive(Clone)]
pub struct SharedSecretVerifier {
    secret: String,
}

impl SharedSecretVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Mint a token for `email`, valid for `ttl`
    pub fn issue(&self, email: &str, ttl: ChronoDuration) -> Result<String> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(ttl)
            .ok_or(IdentityError::Lifetime)?;
        let claims = SharedSecretClaims {
            sub: email.to_string(),
            email: email.to_string(),
            iss: SHARED_SECRET_ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        let key = EncodingKey::from_secret(self.secret.as_bytes());
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &key)?)
    }
}

#[async_trait]
impl IdentityVerifier for SharedSecretVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[SHARED_SECRET_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let data = decode::<IdTokenClaims>(token, &key, &validation)?;
        identity_from_claims(data.claims)
    }
}

/// Build the verifier the configuration asks for: shared secret when one is
/// set, otherwise the managed provider.
pub fn verifier_from_settings(
    settings: &IdentitySettings,
) -> ServerResult<Arc<dyn IdentityVerifier>> {
    if let Some(secret) = settings.shared_secret() {
        tracing::warn!("Using shared-secret identity verification (development mode)");
        return Ok(Arc::new(SharedSecretVerifier::new(secret)));
    }

    let project_id = settings.resolve_project_id()?.ok_or_else(|| {
        ServerError::Config("identity project id is not configured".to_string())
    })?;

    tracing::info!(project_id = %project_id, "Using managed identity provider");
    let verifier = ManagedIdentityVerifier::new(
        project_id,
        settings.jwks_url.clone(),
        Duration::from_secs(settings.key_cache_secs),
    )
    .map_err(|e| ServerError::Config(e.to_string()))?;

    Ok(Arc::new(verifier))
}
