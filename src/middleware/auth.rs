// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session middleware.

use crate::error::AppError;
use crate::services::options::SESSION_MAX_AGE;
use crate::services::session::{resolve_session, SessionUser};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "rollup_auth_session";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Subject (user ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
}

/// Authenticated session, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: SessionUser,
    /// Expiration time (Unix timestamp)
    pub expires: usize,
}

/// Middleware that requires a valid session token whose subject resolves
/// to a stored user.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(SESSION_COOKIE) {
        cookie.value().to_string()
    } else {
        request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_string)
            .ok_or_else(|| AppError::Unauthorized("no session token".to_string()))?
    };

    let claims = decode_session_token(&token, &state.config.jwt_signing_key)?;
    let user = resolve_session(state.auth.adapter.as_ref(), &claims).await?;

    request.extensions_mut().insert(Session {
        user,
        expires: claims.exp,
    });

    Ok(next.run(request).await)
}

/// Verify a session token and return its claims.
pub fn decode_session_token(token: &str, signing_key: &[u8]) -> Result<SessionClaims, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
}

/// Create a JWT for a user session.
pub fn create_jwt(
    user_id: &str,
    name: Option<&str>,
    email: Option<&str>,
    picture: Option<&str>,
    signing_key: &[u8],
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = SessionClaims {
        sub: Some(user_id.to_string()),
        name: name.map(str::to_string),
        email: email.map(str::to_string),
        picture: picture.map(str::to_string),
        iat: now,
        exp: now + SESSION_MAX_AGE.as_secs() as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
