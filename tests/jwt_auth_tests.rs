// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session token tests.
//!
//! These tests pin the claim layout that the sign-in callback writes and
//! the session middleware reads, catching compatibility issues early.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use rollup_auth::middleware::auth::{create_jwt, decode_session_token};
use serde::Deserialize;
use serde_json::json;

mod common;
use common::{create_test_jwt, now_secs};

/// Canonical claim layout. If either side changes, this test should fail.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
    exp: usize,
    iat: usize,
}

const KEY: &[u8] = b"test_signing_key_32_bytes_long!!";

#[test]
fn test_jwt_roundtrip() {
    let token = create_jwt(
        "018f-user",
        Some("Ann"),
        Some("ann@example.com"),
        Some("https://x/y.png"),
        KEY,
    )
    .unwrap();

    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(KEY),
        &Validation::new(Algorithm::HS256),
    )
    .expect("Failed to decode JWT - check Claims struct compatibility");

    assert_eq!(token_data.claims.sub, "018f-user");
    assert_eq!(token_data.claims.name.as_deref(), Some("Ann"));
    assert_eq!(token_data.claims.email.as_deref(), Some("ann@example.com"));
    assert_eq!(token_data.claims.picture.as_deref(), Some("https://x/y.png"));
    assert!(token_data.claims.exp > token_data.claims.iat);
}

#[test]
fn test_token_without_sub_still_decodes() {
    // Missing sub is rejected by the session callback, not by decoding,
    // so the response is an authorization failure rather than a bad token.
    let now = now_secs();
    let token = create_test_jwt(&json!({"iat": now, "exp": now + 60}), KEY);

    let claims = decode_session_token(&token, KEY).unwrap();
    assert!(claims.sub.is_none());
}

#[test]
fn test_expired_token_is_rejected() {
    let now = now_secs();
    let token = create_test_jwt(
        &json!({"sub": "u1", "iat": now - 7200, "exp": now - 3600}),
        KEY,
    );

    assert!(decode_session_token(&token, KEY).is_err());
}

#[test]
fn test_tampered_token_is_rejected() {
    let token = create_jwt("u1", None, None, None, KEY).unwrap();
    let forged_payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"admin","iat":0,"exp":9999999999}"#);
    let mut parts: Vec<&str> = token.split('.').collect();
    parts[1] = &forged_payload;

    assert!(decode_session_token(&parts.join("."), KEY).is_err());
}
