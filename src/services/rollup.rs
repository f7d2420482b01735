// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rollup ID OAuth provider definition.
//!
//! Rollup ID issues ES256-signed id tokens, but the id token only carries the
//! basic OIDC claims. Connected accounts and ERC-4337 wallets are only in the
//! userinfo response, so the provider always fetches userinfo even though
//! `id_token` is enabled.

use crate::error::{AppError, Result};
use crate::models::{Profile, ProfileExtensions, RollupProfile};
use crate::services::oidc::TokenSet;
use async_trait::async_trait;
use jsonwebtoken::Algorithm;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use validator::Validate;

pub const PROVIDER_ID: &str = "rollup";
const PROVIDER_NAME: &str = "Rollup ID";

const ISSUER: &str = "https://passport.rollup.id";
const WELL_KNOWN_URL: &str = "https://passport.rollup.id/.well-known/openid-configuration";
const TOKEN_URL: &str = "https://passport.rollup.id/token";
const USERINFO_URL: &str = "https://passport.rollup.id/userinfo";

const DEFAULT_SCOPE: &str = "openid email profile connected_accounts erc_4337";
/// Latency on the authorize endpoint is higher than a typical provider's.
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Oauth,
    Oidc,
}

/// Callback checks performed by the sign-in routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Check {
    State,
    Pkce,
    Nonce,
}

/// Client registration metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMetadata {
    pub authorization_signed_response_alg: Algorithm,
    pub id_token_signed_response_alg: Algorithm,
}

/// Caller-supplied provider configuration, merged over the defaults.
#[derive(Debug, Clone, Default)]
pub struct OAuthUserConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Extra or overriding authorization request parameters
    pub authorization_params: BTreeMap<String, String>,
    pub http_timeout: Option<Duration>,
    /// Token endpoint override, e.g. for a local stand-in provider
    pub token_url: Option<String>,
    /// Userinfo endpoint override
    pub userinfo_url: Option<String>,
}

/// Complete provider description.
#[derive(Debug, Clone)]
pub struct RollupProvider {
    pub id: &'static str,
    pub name: &'static str,
    pub provider_type: ProviderType,
    pub issuer: String,
    pub well_known: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub client: ClientMetadata,
    pub authorization_params: BTreeMap<String, String>,
    pub id_token: bool,
    pub checks: Vec<Check>,
    pub http_timeout: Duration,
    pub client_id: String,
    pub client_secret: String,
}

/// Build the Rollup ID provider. Values in `options` win over the defaults.
pub fn rollup(options: OAuthUserConfig) -> RollupProvider {
    let mut authorization_params = BTreeMap::from([
        ("scope".to_string(), DEFAULT_SCOPE.to_string()),
        ("prompt".to_string(), "consent".to_string()),
    ]);
    authorization_params.extend(options.authorization_params);

    RollupProvider {
        id: PROVIDER_ID,
        name: PROVIDER_NAME,
        provider_type: ProviderType::Oauth,
        issuer: ISSUER.to_string(),
        well_known: WELL_KNOWN_URL.to_string(),
        token_url: options.token_url.unwrap_or_else(|| TOKEN_URL.to_string()),
        userinfo_url: options
            .userinfo_url
            .unwrap_or_else(|| USERINFO_URL.to_string()),
        client: ClientMetadata {
            authorization_signed_response_alg: Algorithm::ES256,
            id_token_signed_response_alg: Algorithm::ES256,
        },
        authorization_params,
        id_token: true,
        checks: vec![Check::State],
        http_timeout: options.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT),
        client_id: options.client_id,
        client_secret: options.client_secret,
    }
}

/// Fetches the raw userinfo document for an access token.
#[async_trait]
pub trait UserinfoClient: Send + Sync {
    async fn userinfo(&self, access_token: &str) -> Result<serde_json::Value>;
}

impl RollupProvider {
    pub fn scope(&self) -> &str {
        self.authorization_params
            .get("scope")
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn requires_check(&self, check: Check) -> bool {
        self.checks.contains(&check)
    }

    /// Fetch and validate the extended userinfo.
    pub async fn request_userinfo(
        &self,
        tokens: &TokenSet,
        client: &dyn UserinfoClient,
    ) -> Result<RollupProfile> {
        let Some(access_token) = tokens.access_token.as_deref() else {
            return Err(AppError::OAuth("no access token provided".to_string()));
        };

        let raw = client.userinfo(access_token).await?;
        parse_userinfo(raw)
    }

    /// Normalize a validated userinfo payload.
    pub fn profile(&self, userinfo: RollupProfile) -> Profile {
        Profile {
            id: userinfo.sub,
            email: Some(userinfo.email),
            name: Some(userinfo.name),
            image: Some(userinfo.picture),
            extensions: ProfileExtensions {
                connected_accounts: userinfo.connected_accounts,
                erc_4337: userinfo.erc_4337,
            },
        }
    }
}

/// Parse a userinfo document against the Rollup schema. Missing fields,
/// wrong types, and malformed email or picture URL are all rejected.
pub fn parse_userinfo(raw: serde_json::Value) -> Result<RollupProfile> {
    let profile: RollupProfile = serde_json::from_value(raw)
        .map_err(|e| AppError::OAuth(format!("invalid userinfo: {}", e)))?;

    profile
        .validate()
        .map_err(|e| AppError::OAuth(format!("invalid userinfo: {}", e)))?;

    Ok(profile)
}
