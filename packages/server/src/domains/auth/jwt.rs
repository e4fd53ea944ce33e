use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("token has no key id")]
    MissingKeyId,

    #[error("public key not found")]
    UnknownKey,

    #[error("could not load signing keys: {0}")]
    KeyFetch(String),
}

/// Identity-token claims the API relies on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(rename = "cognito:username", default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "cognito:groups", default)]
    pub groups: Vec<String>,
    pub aud: String,
    pub iss: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

/// Verifies bearer tokens and returns their claims.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

fn validation(algorithm: Algorithm, issuer: &str, audience: &str) -> Validation {
    let mut validation = Validation::new(algorithm);
    validation.set_issuer(&[issuer]);
    validation.set_audience(&[audience]);
    validation
}

/// Shared-secret HS256 verifier for tests and local development.
#[derive(Clone)]
pub struct HsVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
}

impl HsVerifier {
    pub fn new(secret: &str, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    /// Issue a one-hour token for `email` with the given groups.
    pub fn issue_token(&self, sub: &str, email: &str, groups: &[&str]) -> Result<String, AuthError> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: sub.to_string(),
            email: Some(email.to_string()),
            email_verified: true,
            username: Some(sub.to_string()),
            groups: groups.iter().map(|g| g.to_string()).collect(),
            aud: self.audience.clone(),
            iss: self.issuer.clone(),
            exp: (now + chrono::Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }
}

#[async_trait]
impl TokenVerifier for HsVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = validation(Algorithm::HS256, &self.issuer, &self.audience);
        Ok(decode::<Claims>(token, &self.decoding_key, &validation)?.claims)
    }
}

/// RS256 verifier backed by the user pool's published JWKS.
///
/// Keys are fetched on first use and cached. A token signed with an unknown
/// key id triggers a refetch, which covers key rotation. Refetches happen at
/// most once per `refresh_interval`; inside that window unknown key ids are
/// rejected without contacting the provider.
pub struct JwksVerifier {
    jwks_url: String,
    issuer: String,
    audience: String,
    http: reqwest::Client,
    keys: RwLock<Option<JwkSet>>,
    last_refresh: Mutex<Option<Instant>>,
    refresh_interval: Duration,
}

/// Minimum time between two key-set fetches.
pub const DEFAULT_JWKS_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

impl JwksVerifier {
    pub fn new(jwks_url: impl Into<String>, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            http: reqwest::Client::new(),
            keys: RwLock::new(None),
            last_refresh: Mutex::new(None),
            refresh_interval: DEFAULT_JWKS_REFRESH_INTERVAL,
        }
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Build with a preloaded key set.
    pub fn with_keys(self, keys: JwkSet) -> Self {
        Self {
            keys: RwLock::new(Some(keys)),
            ..self
        }
    }

    /// Refetch the key set unless the last fetch is more recent than
    /// `refresh_interval`. Concurrent callers wait for one fetch.
    async fn refresh_if_due(&self, kid: &str) -> Result<(), AuthError> {
        let mut last_refresh = self.last_refresh.lock().await;

        // Another caller may have loaded the key while we waited.
        if self.decoding_key(kid).await?.is_some() {
            return Ok(());
        }

        if let Some(at) = *last_refresh {
            if at.elapsed() < self.refresh_interval {
                debug!(kid = %kid, "Unknown key id, key set refreshed recently");
                return Err(AuthError::UnknownKey);
            }
        }

        *last_refresh = Some(Instant::now());
        self.refresh_keys().await
    }

    async fn refresh_keys(&self) -> Result<(), AuthError> {
        let keys = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        info!(keys = keys.keys.len(), url = %self.jwks_url, "Loaded signing keys");
        *self.keys.write().await = Some(keys);
        Ok(())
    }

    async fn decoding_key(&self, kid: &str) -> Result<Option<DecodingKey>, AuthError> {
        let guard = self.keys.read().await;
        let Some(jwk) = guard.as_ref().and_then(|set| set.find(kid)) else {
            return Ok(None);
        };
        Ok(Some(DecodingKey::from_jwk(jwk)?))
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token)?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;

        let key = match self.decoding_key(&kid).await? {
            Some(key) => key,
            None => {
                match self.refresh_if_due(&kid).await {
                    Ok(()) => {}
                    Err(AuthError::UnknownKey) => return Err(AuthError::UnknownKey),
                    Err(e) => {
                        warn!(error = %e, "Signing key refresh failed");
                        return Err(e);
                    }
                }
                self.decoding_key(&kid).await?.ok_or(AuthError::UnknownKey)?
            }
        };

        let validation = validation(Algorithm::RS256, &self.issuer, &self.audience);
        Ok(decode::<Claims>(token, &key, &validation)?.claims)
    }
}
