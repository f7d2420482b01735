// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OIDC client for the Rollup ID endpoints.
//!
//! Handles:
//! - Discovery document fetch (cached, TTL from Cache-Control)
//! - Authorization URL construction
//! - Authorization-code exchange at the token endpoint
//! - ES256 id token verification against the provider JWKS (cached)
//! - Userinfo fetch for the provider's `request_userinfo` hook

use crate::error::{AppError, Result};
use crate::services::rollup::{RollupProvider, UserinfoClient};
use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;

/// Token endpoint result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenSet {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    /// Access token expiry (Unix seconds)
    pub expires_at: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub session_state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    id_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    token_type: Option<String>,
    scope: Option<String>,
    session_state: Option<String>,
}

impl TokenResponse {
    fn into_token_set(self, now: i64) -> TokenSet {
        TokenSet {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            id_token: self.id_token,
            expires_at: self
                .expires_at
                .or_else(|| self.expires_in.and_then(|secs| now.checked_add(secs))),
            token_type: self.token_type,
            scope: self.scope,
            session_state: self.session_state,
        }
    }
}

/// Claims taken from a verified id token.
#[derive(Debug, Clone, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    pub iss: String,
    pub exp: usize,
    pub iat: Option<usize>,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Endpoints from the discovery document.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub jwks_uri: String,
    pub token_endpoint: Option<String>,
    pub userinfo_endpoint: Option<String>,
}

#[derive(Clone)]
enum VerifierMode {
    Remote,
    StaticKey {
        kid: String,
        decoding_key: Arc<DecodingKey>,
    },
}

#[derive(Clone)]
struct DiscoveryCacheEntry {
    metadata: ProviderMetadata,
    expires_at: Instant,
}

#[derive(Clone)]
struct JwksCacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// OIDC client bound to one provider.
pub struct OidcClient {
    http_client: reqwest::Client,
    provider: Arc<RollupProvider>,
    mode: VerifierMode,
    discovery_cache: RwLock<Option<DiscoveryCacheEntry>>,
    jwks_cache: RwLock<Option<JwksCacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl OidcClient {
    /// Create a client that discovers endpoints and keys over the network.
    pub fn new(provider: Arc<RollupProvider>) -> anyhow::Result<Self> {
        Self::with_mode(provider, VerifierMode::Remote)
    }

    /// Create a client with a static ES256 public key and built-in endpoints.
    ///
    /// This is intended for deterministic local/integration tests.
    pub fn new_with_static_key(
        provider: Arc<RollupProvider>,
        kid: impl Into<String>,
        decoding_key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static OIDC kid must not be empty");
        }

        Self::with_mode(
            provider,
            VerifierMode::StaticKey {
                kid,
                decoding_key: Arc::new(decoding_key),
            },
        )
    }

    fn with_mode(provider: Arc<RollupProvider>, mode: VerifierMode) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(provider.http_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("failed building OIDC HTTP client: {}", e))?;

        tracing::info!(
            provider = provider.id,
            issuer = %provider.issuer,
            timeout_ms = provider.http_timeout.as_millis() as u64,
            "Initialized OIDC client"
        );

        Ok(Self {
            http_client,
            provider,
            mode,
            discovery_cache: RwLock::new(None),
            jwks_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn provider(&self) -> &RollupProvider {
        &self.provider
    }

    /// Build the authorization redirect URL.
    pub async fn authorization_url(&self, state: &str, redirect_uri: &str) -> Result<String> {
        let metadata = self.metadata(false).await?;

        let mut params: Vec<(&str, &str)> = vec![
            ("client_id", self.provider.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
        ];
        for (key, value) in &self.provider.authorization_params {
            params.push((key.as_str(), value.as_str()));
        }
        params.push(("state", state));

        let url = url::Url::parse_with_params(&metadata.authorization_endpoint, &params)
            .map_err(|e| AppError::OAuth(format!("invalid authorization endpoint: {}", e)))?;

        Ok(url.to_string())
    }

    /// Exchange an authorization code at the token endpoint.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenSet> {
        let response = self
            .http_client
            .post(&self.provider.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("client_id", self.provider.client_id.as_str()),
                ("client_secret", self.provider.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::OAuth(format!("token request failed: {}", e)))?;

        let tokens: TokenResponse = check_response_json(response, "token").await?;
        Ok(tokens.into_token_set(chrono::Utc::now().timestamp()))
    }

    /// Verify an id token's signature, issuer, audience and expiry.
    pub async fn verify_id_token(&self, id_token: &str) -> Result<IdTokenClaims> {
        let expected_alg = self.provider.client.id_token_signed_response_alg;

        let header = decode_header(id_token)
            .map_err(|e| AppError::OAuth(format!("invalid id token header: {}", e)))?;

        if header.alg != expected_alg {
            return Err(AppError::OAuth(format!(
                "unexpected id token alg: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AppError::OAuth("missing id token kid".to_string()))?;

        let decoding_key = self.decoding_key_for_kid(&kid).await?;

        let mut validation = Validation::new(expected_alg);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[self.provider.issuer.as_str()]);
        validation.set_audience(&[self.provider.client_id.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let token_data = decode::<IdTokenClaims>(id_token, decoding_key.as_ref(), &validation)
            .map_err(|e| AppError::OAuth(format!("id token validation failed: {}", e)))?;

        tracing::debug!(
            subject = %token_data.claims.sub,
            issuer = %token_data.claims.iss,
            exp = token_data.claims.exp,
            "Id token verified"
        );

        Ok(token_data.claims)
    }

    async fn metadata(&self, force_refresh: bool) -> Result<ProviderMetadata> {
        if let VerifierMode::StaticKey { .. } = self.mode {
            return Ok(self.builtin_metadata());
        }

        if !force_refresh {
            let cache = self.discovery_cache.read().await;
            if let Some(entry) = cache
                .as_ref()
                .filter(|entry| entry.expires_at > Instant::now())
            {
                return Ok(entry.metadata.clone());
            }
        }

        let response = self
            .http_client
            .get(&self.provider.well_known)
            .send()
            .await
            .map_err(|e| AppError::OAuth(format!("discovery request failed: {}", e)))?;

        let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_CACHE_TTL);
        let metadata: ProviderMetadata = check_response_json(response, "discovery").await?;

        if metadata.issuer.trim_end_matches('/') != self.provider.issuer.trim_end_matches('/') {
            return Err(AppError::OAuth(format!(
                "discovery issuer mismatch: {}",
                metadata.issuer
            )));
        }

        *self.discovery_cache.write().await = Some(DiscoveryCacheEntry {
            metadata: metadata.clone(),
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "OIDC discovery cache refreshed");
        Ok(metadata)
    }

    fn builtin_metadata(&self) -> ProviderMetadata {
        let issuer = self.provider.issuer.trim_end_matches('/');
        ProviderMetadata {
            issuer: issuer.to_string(),
            authorization_endpoint: format!("{}/authorize", issuer),
            jwks_uri: format!("{}/.well-known/jwks.json", issuer),
            token_endpoint: Some(self.provider.token_url.clone()),
            userinfo_endpoint: Some(self.provider.userinfo_url.clone()),
        }
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>> {
        if let VerifierMode::StaticKey {
            kid: static_kid,
            decoding_key,
        } = &self.mode
        {
            if kid == static_kid {
                return Ok(decoding_key.clone());
            }

            return Err(AppError::OAuth(format!(
                "unknown id token kid for static verifier: {}",
                kid
            )));
        }

        if let Some(key) = self.lookup_cached_key(kid).await {
            return Ok(key);
        }

        // A key rotation shows up as an unknown kid; retry once with fresh
        // discovery before giving up.
        for force_refresh in [false, true] {
            self.refresh_jwks(force_refresh).await?;
            if let Some(key) = self.lookup_cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(AppError::OAuth(format!(
            "id token kid not found in JWKS after refresh: {}",
            kid
        )))
    }

    async fn lookup_cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.jwks_cache.read().await;
        let now = Instant::now();
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > now)
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_jwks(&self, force_refresh: bool) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;

        if !force_refresh {
            let cache = self.jwks_cache.read().await;
            if cache
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
            {
                return Ok(());
            }
        }

        let jwks_uri = self.metadata(force_refresh).await?.jwks_uri;
        tracing::debug!(jwks_uri = %jwks_uri, "Refreshing JWKS cache");

        let response = self
            .http_client
            .get(&jwks_uri)
            .send()
            .await
            .map_err(|e| AppError::OAuth(format!("JWKS request failed: {}", e)))?;

        let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_CACHE_TTL);
        let jwks: Jwks = check_response_json(response, "JWKS").await?;

        let keys_by_kid = usable_keys(jwks);
        if keys_by_kid.is_empty() {
            return Err(AppError::OAuth(
                "JWKS response did not include any usable ES256 keys".to_string(),
            ));
        }

        *self.jwks_cache.write().await = Some(JwksCacheEntry {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "JWKS cache refreshed");
        Ok(())
    }
}

#[async_trait]
impl UserinfoClient for OidcClient {
    async fn userinfo(&self, access_token: &str) -> Result<serde_json::Value> {
        let response = self
            .http_client
            .get(&self.provider.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::OAuth(format!("userinfo request failed: {}", e)))?;

        check_response_json(response, "userinfo").await
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    #[serde(default)]
    kid: String,
    kty: String,
    crv: Option<String>,
    alg: Option<String>,
    x: Option<String>,
    y: Option<String>,
    #[serde(rename = "use")]
    use_: Option<String>,
}

/// Keep P-256 signing keys, keyed by kid.
fn usable_keys(jwks: Jwks) -> HashMap<String, Arc<DecodingKey>> {
    let mut keys_by_kid = HashMap::new();

    for jwk in jwks.keys {
        if jwk.kty != "EC" || jwk.crv.as_deref() != Some("P-256") {
            continue;
        }

        if jwk.kid.trim().is_empty() {
            continue;
        }

        if jwk.alg.as_deref().is_some_and(|alg| alg != "ES256") {
            continue;
        }

        if jwk.use_.as_deref().is_some_and(|use_| use_ != "sig") {
            continue;
        }

        let (Some(x), Some(y)) = (jwk.x.as_deref(), jwk.y.as_deref()) else {
            continue;
        };

        match DecodingKey::from_ec_components(x, y) {
            Ok(key) => {
                keys_by_kid.insert(jwk.kid, Arc::new(key));
            }
            Err(e) => {
                tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid EC JWKS key");
            }
        }
    }

    keys_by_kid
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
    what: &str,
) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::OAuth(format!(
            "{} endpoint returned HTTP {}: {}",
            what, status, body
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::OAuth(format!("invalid {} JSON: {}", what, e)))
}

fn cache_ttl_from_headers(headers: &reqwest::header::HeaderMap, fallback: Duration) -> Duration {
    headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_cache_control_max_age)
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    value.split(',').find_map(|directive| {
        directive
            .trim()
            .strip_prefix("max-age=")
            .and_then(|raw| raw.trim_matches('"').parse::<u64>().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cache_control_max_age_valid() {
        assert_eq!(
            parse_cache_control_max_age("public, max-age=3600"),
            Some(3600)
        );
        assert_eq!(parse_cache_control_max_age("max-age=60"), Some(60));
        assert_eq!(parse_cache_control_max_age("max-age=\"120\""), Some(120));
    }

    #[test]
    fn parse_cache_control_max_age_invalid() {
        assert_eq!(parse_cache_control_max_age("public, immutable"), None);
        assert_eq!(parse_cache_control_max_age("max-age=abc"), None);
        assert_eq!(parse_cache_control_max_age(""), None);
    }

    #[test]
    fn token_response_computes_expiry() {
        let response: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "at",
            "id_token": "it",
            "expires_in": 3600,
            "token_type": "Bearer",
        }))
        .unwrap();

        let tokens = response.into_token_set(1_000);
        assert_eq!(tokens.access_token.as_deref(), Some("at"));
        assert_eq!(tokens.expires_at, Some(4_600));
        assert!(tokens.refresh_token.is_none());
    }

    #[test]
    fn token_response_huge_expires_in_has_no_expiry() {
        let response: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "at",
            "expires_in": i64::MAX,
        }))
        .unwrap();

        let tokens = response.into_token_set(1_700_000_000);
        assert_eq!(tokens.expires_at, None);
        assert_eq!(tokens.access_token.as_deref(), Some("at"));
    }

    #[test]
    fn usable_keys_filters_non_es256() {
        let jwks: Jwks = serde_json::from_value(serde_json::json!({
            "keys": [
                { "kid": "rsa", "kty": "RSA", "n": "abc", "e": "AQAB" },
                { "kid": "enc", "kty": "EC", "crv": "P-256", "use": "enc",
                  "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
                  "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0" },
                { "kid": "p384", "kty": "EC", "crv": "P-384", "x": "a", "y": "b" },
                { "kid": "sig", "kty": "EC", "crv": "P-256", "alg": "ES256",
                  "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
                  "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0" },
            ]
        }))
        .unwrap();

        let keys = usable_keys(jwks);
        assert_eq!(keys.len(), 1);
        assert!(keys.contains_key("sig"));
    }
}
