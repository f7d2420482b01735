// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rollup ID sign-in routes.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;
use url::Url;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::services::options::SESSION_MAX_AGE;
use crate::services::rollup::Check;
use crate::services::signin::complete_sign_in;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// A signed state older than this is refused.
const STATE_MAX_AGE_MS: u128 = 10 * 60 * 1000;

/// Cookie carrying the nonce that ties a state to the browser that
/// started the sign-in.
pub const STATE_COOKIE: &str = "rollup_auth_state";
const STATE_COOKIE_PATH: &str = "/auth/callback";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signin/rollup", get(sign_in))
        .route("/auth/callback/rollup", get(callback))
        .route("/auth/signout", get(sign_out))
}

/// Query parameters for starting the sign-in flow.
#[derive(Deserialize)]
pub struct SignInParams {
    /// Frontend URL or path to land on once signed in.
    /// Must be on the FRONTEND_URL origin; otherwise FRONTEND_URL is used.
    #[serde(default)]
    redirect_uri: Option<String>,
}

/// Start sign-in: redirect to the Rollup ID authorization endpoint.
async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<SignInParams>,
) -> Result<(CookieJar, Redirect)> {
    let frontend_url =
        post_login_target(params.redirect_uri.as_deref(), &state.config.frontend_url);

    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let timestamp = now_millis()?;
    let oauth_state = sign_state(
        &frontend_url,
        timestamp,
        &nonce,
        &state.config.oauth_state_key,
    )?;

    let auth_url = state
        .oidc
        .authorization_url(&oauth_state, &state.config.callback_url())
        .await?;

    tracing::info!(
        client_id = %state.config.rollup_client_id,
        frontend_url = %frontend_url,
        "Starting sign-in, redirecting to Rollup ID"
    );

    let cookie = Cookie::build((STATE_COOKIE, nonce))
        .path(STATE_COOKIE_PATH)
        .http_only(true)
        .secure(state.config.api_url.starts_with("https://"))
        .same_site(SameSite::Lax)
        .max_age(time::Duration::milliseconds(STATE_MAX_AGE_MS as i64))
        .build();

    Ok((jar.add(cookie), Redirect::temporary(&auth_url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback: exchange the code, fetch userinfo, sign in, set session.
async fn callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    let provider = state.auth.provider.as_ref();

    let browser_nonce = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(Cookie::build(STATE_COOKIE).path(STATE_COOKIE_PATH).build());

    let verified = params
        .state
        .as_deref()
        .and_then(|s| {
            verify_and_decode_state(s, &state.config.oauth_state_key, now_millis().ok()?)
        })
        .filter(|verified| {
            let matches = browser_nonce
                .as_deref()
                .is_some_and(|n| bool::from(n.as_bytes().ct_eq(verified.nonce.as_bytes())));
            if !matches {
                tracing::warn!("OAuth state was not issued to this browser");
            }
            matches
        });

    let frontend_url = match verified {
        Some(verified) => verified.frontend_url,
        None if provider.requires_check(Check::State) => {
            tracing::warn!("Invalid, expired or missing state parameter");
            return Err(AppError::BadRequest("invalid state".to_string()));
        }
        None => state.config.frontend_url.clone(),
    };

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Rollup ID");
        let redirect = format!("{}?error={}", frontend_url, urlencoding::encode(&error));
        return Ok((jar, Redirect::temporary(&redirect)));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("missing code".to_string()))?;

    tracing::info!("Exchanging authorization code for tokens");
    let tokens = state
        .oidc
        .exchange_code(&code, &state.config.callback_url())
        .await?;

    let id_claims = match tokens.id_token.as_deref() {
        Some(id_token) => Some(state.oidc.verify_id_token(id_token).await?),
        None if provider.id_token => {
            return Err(AppError::OAuth("token response has no id_token".to_string()));
        }
        None => None,
    };

    let userinfo = provider
        .request_userinfo(&tokens, &*state.oidc)
        .await?;

    if let Some(claims) = &id_claims {
        if claims.sub != userinfo.sub {
            return Err(AppError::OAuth(
                "userinfo subject does not match id token".to_string(),
            ));
        }
    }

    let profile = provider.profile(userinfo);
    let user = complete_sign_in(
        state.auth.adapter.as_ref(),
        &state.auth.sign_in_locks,
        provider,
        &profile,
        &tokens,
    )
    .await?;

    tracing::info!(user_id = %user.id, provider = provider.id, "Sign-in complete");

    let jwt = create_jwt(
        &user.id,
        user.name.as_deref(),
        user.email.as_deref(),
        user.image.as_deref(),
        &state.config.jwt_signing_key,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, jwt))
        .path("/")
        .http_only(true)
        .secure(state.config.api_url.starts_with("https://"))
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(SESSION_MAX_AGE.as_secs() as i64))
        .build();

    Ok((jar.add(cookie), Redirect::temporary(&frontend_url)))
}

/// Sign out: drop the session cookie and go back to the frontend.
async fn sign_out(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    (jar, Redirect::temporary(&state.config.frontend_url))
}

fn now_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

/// Where to land after sign-in: a path, or an absolute URL on the
/// frontend's origin. Anything else falls back to the frontend URL.
fn post_login_target(requested: Option<&str>, frontend_url: &str) -> String {
    let Some(requested) = requested else {
        return frontend_url.to_string();
    };
    let Ok(base) = Url::parse(frontend_url) else {
        return frontend_url.to_string();
    };

    let is_path =
        requested.starts_with('/') && !requested.starts_with("//") && !requested.contains('\\');
    let target = if is_path {
        base.join(requested).ok()
    } else {
        Url::parse(requested)
            .ok()
            .filter(|url| url.origin() == base.origin())
    };

    match target {
        Some(url) => url.to_string(),
        None => {
            tracing::warn!(requested = %requested, "Ignoring off-origin redirect_uri");
            frontend_url.to_string()
        }
    }
}

/// Decoded contents of a verified OAuth state.
#[derive(Debug, PartialEq)]
struct VerifiedState {
    frontend_url: String,
    nonce: String,
}

/// Encode `frontend_url|timestamp_hex|nonce|signature_hex` as URL-safe base64.
fn sign_state(frontend_url: &str, timestamp_ms: u128, nonce: &str, secret: &[u8]) -> Result<String> {
    let state_payload = format!("{}|{:x}|{}", frontend_url, timestamp_ms, nonce);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(state_payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed_state = format!("{}|{}", state_payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed_state.as_bytes()))
}

/// Verify HMAC signature and age, and decode the frontend URL and nonce
/// from the OAuth state parameter.
fn verify_and_decode_state(state: &str, secret: &[u8], now_ms: u128) -> Option<VerifiedState> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // The frontend URL may itself contain '|', so split from the right.
    let mut parts = state_str.rsplitn(4, '|');
    let signature_hex = parts.next()?;
    let nonce = parts.next()?;
    let timestamp_hex = parts.next()?;
    let frontend_url = parts.next()?;

    let payload = format!("{}|{}|{}", frontend_url, timestamp_hex, nonce);

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    let expected_signature = hex::encode(mac.finalize().into_bytes());

    if !bool::from(signature_hex.as_bytes().ct_eq(expected_signature.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let timestamp = u128::from_str_radix(timestamp_hex, 16).ok()?;
    if now_ms.saturating_sub(timestamp) > STATE_MAX_AGE_MS {
        tracing::warn!("OAuth state expired");
        return None;
    }

    Some(VerifiedState {
        frontend_url: frontend_url.to_string(),
        nonce: nonce.to_string(),
    })
}
