//! JWKS fetching and caching.
//!
//! Remote key discovery for cross-tenant verification: the admin tenant's
//! published key set is fetched over HTTP and cached with a TTL. Fetch
//! failures are network/availability errors and must stay distinguishable
//! from "token invalid"; callers surface them as a separate failure mode.

use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

/// JWKS client errors.
#[derive(Debug, Error)]
pub enum JwksError {
    /// The key set could not be fetched (network, HTTP, or decode failure).
    /// This is an availability problem, not a statement about any token.
    #[error("JWKS fetch failed: {0}")]
    Fetch(String),

    /// A key in the set is unusable for verification.
    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    /// No key in the set matches the requested key ID.
    #[error("Key not found: {0}")]
    KeyNotFound(String),
}

/// A JSON Web Key (RFC 7517), RSA signature keys only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type (`RSA`).
    pub kty: String,

    /// Key ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Intended use (`sig`).
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,

    /// Algorithm (`RS256`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// RSA modulus, base64url.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA exponent, base64url.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

impl Jwk {
    /// Build a verification key from the RSA components.
    pub fn decoding_key(&self) -> Result<DecodingKey, JwksError> {
        let n = self
            .n
            .as_deref()
            .ok_or_else(|| JwksError::InvalidKey("missing modulus (n)".to_string()))?;
        let e = self
            .e
            .as_deref()
            .ok_or_else(|| JwksError::InvalidKey("missing exponent (e)".to_string()))?;

        DecodingKey::from_rsa_components(n, e)
            .map_err(|err| JwksError::InvalidKey(err.to_string()))
    }
}

/// A JSON Web Key Set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JwkSet {
    /// The published keys.
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Find a key by its key ID.
    #[must_use]
    pub fn find_key(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }

    /// Keys usable for a token: the kid match when the token names one,
    /// otherwise every key in the set.
    #[must_use]
    pub fn candidates(&self, kid: Option<&str>) -> Vec<&Jwk> {
        match kid {
            Some(kid) => self.find_key(kid).into_iter().collect(),
            None => self.keys.iter().collect(),
        }
    }
}

struct CachedSet {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// JWKS endpoint client with TTL caching.
#[derive(Clone)]
pub struct JwksClient {
    url: String,
    cache: Arc<RwLock<Option<CachedSet>>>,
    cache_ttl: Duration,
    http: reqwest::Client,
}

impl JwksClient {
    /// Create a client for a JWKS endpoint URL.
    pub fn new(url: impl Into<String>) -> Result<Self, JwksError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| JwksError::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            cache: Arc::new(RwLock::new(None)),
            cache_ttl: Duration::from_secs(300),
            http,
        })
    }

    /// Override the cache TTL.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Fetch the key set from the endpoint and refresh the cache.
    pub async fn fetch(&self) -> Result<JwkSet, JwksError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| JwksError::Fetch(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(JwksError::Fetch(format!("HTTP {}", response.status())));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| JwksError::Fetch(format!("invalid JWKS body: {e}")))?;

        let mut cache = self.cache.write().await;
        *cache = Some(CachedSet {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
        });

        Ok(jwks)
    }

    /// The key set, served from cache while fresh.
    pub async fn get(&self) -> Result<JwkSet, JwksError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(cached.jwks.clone());
                }
            }
        }
        self.fetch().await
    }

    /// A key by kid, re-fetching once on a miss to pick up rotation.
    pub async fn get_key(&self, kid: &str) -> Result<Jwk, JwksError> {
        let jwks = self.get().await?;
        if let Some(key) = jwks.find_key(kid) {
            return Ok(key.clone());
        }

        let jwks = self.fetch().await?;
        jwks.find_key(kid)
            .cloned()
            .ok_or_else(|| JwksError::KeyNotFound(kid.to_string()))
    }
}

impl std::fmt::Debug for JwksClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksClient")
            .field("url", &self.url)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}
