// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use rollup_auth::error::AppError;
use serde_json::Value;

async fn error_body(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_authorization_failures_are_401_not_500() {
    let (status, body) = error_body(AppError::Unauthorized("user not found".to_string())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    assert!(body.get("details").is_none());

    let (status, _) = error_body(AppError::InvalidToken).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_configuration_errors_hide_details() {
    let err = AppError::unsupported("user", &["wallet".to_string()]).unwrap();
    assert_eq!(err.to_string(), "Unsupported user properties: wallet");

    let (status, body) = error_body(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "configuration_error");
    assert!(body.get("details").is_none());

    let (status, body) = error_body(AppError::NotImplemented("createSession")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "configuration_error");
}

#[test]
fn test_unsupported_is_none_for_empty_remainder() {
    let none: [String; 0] = [];
    assert!(AppError::unsupported("account", &none).is_none());
}

#[test]
fn test_unsupported_fields_are_sorted() {
    let extra = ["zeta".to_string(), "alpha".to_string()];
    match AppError::unsupported("account", &extra) {
        Some(AppError::UnsupportedFields { entity, fields }) => {
            assert_eq!(entity, "account");
            assert_eq!(fields, vec!["alpha", "zeta"]);
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn test_sign_in_failures() {
    let (status, body) = error_body(AppError::OAuth("invalid userinfo".to_string())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "oauth_error");
    assert_eq!(body["details"], "invalid userinfo");

    let (status, body) = error_body(AppError::AccountNotLinked("x".to_string())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "account_not_linked");

    let (status, _) = error_body(AppError::NotFound("user u1".to_string())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = error_body(AppError::Conflict("linked".to_string())).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
