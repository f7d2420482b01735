// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Start one with `gcloud emulators firestore start` and export
//! FIRESTORE_EMULATOR_HOST; otherwise they are skipped.
//!
//! Every test uses fresh ids, so runs against a shared emulator don't collide.

use rollup_auth::db::{FirestoreDb, UserQueries};
use rollup_auth::error::AppError;
use rollup_auth::models::{AccountRef, AccountType, LinkedAccountRecord, UserFields};

mod common;
use common::test_db;

/// Generate a unique suffix for test isolation.
fn unique_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos()
        .to_string()
}

fn account_for(user_id: &str, sub: &str) -> LinkedAccountRecord {
    LinkedAccountRecord {
        account_type: AccountType::Oauth,
        provider: "rollup".to_string(),
        provider_account_id: sub.to_string(),
        access_token: Some("at".to_string()),
        refresh_token: None,
        id_token: None,
        expires_at: Some(1_700_000_000),
        token_type: Some("bearer".to_string()),
        scope: None,
        session_state: None,
        user_id: user_id.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// USER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_user_create_and_lookup() {
    require_emulator!();

    let db = test_db().await;
    let email = format!("{}@example.com", unique_suffix());

    let before = db.get_user_by_email(&email).await.unwrap();
    assert!(before.is_none(), "User should not exist before creation");

    let user = db
        .create_user(UserFields {
            email: Some(email.clone()),
            name: Some("Test User".to_string()),
            image: Some("https://example.com/pic.jpg".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let by_id = db.get_user(&user.id).await.unwrap();
    assert_eq!(by_id, Some(user.clone()));

    let by_email = db.get_user_by_email(&email).await.unwrap();
    assert_eq!(by_email, Some(user.clone()));

    println!("✓ User created and verified: id={}", user.id);
}

#[tokio::test]
async fn test_user_update_merges_fields() {
    require_emulator!();

    let db = test_db().await;
    let user = db
        .create_user(UserFields {
            email: Some(format!("{}@example.com", unique_suffix())),
            name: Some("Old".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let updated = db
        .update_user(
            &user.id,
            UserFields {
                name: Some("New".to_string()),
                image: Some("https://example.com/new.jpg".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("user exists");

    assert_eq!(updated.name.as_deref(), Some("New"));
    assert_eq!(updated.email, user.email);
    assert_eq!(
        updated.image.as_deref(),
        Some("https://example.com/new.jpg")
    );

    let fetched = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(fetched, updated);

    let missing = db
        .update_user(&format!("missing-{}", unique_suffix()), UserFields::default())
        .await
        .unwrap();
    assert!(missing.is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// ACCOUNT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_linked_account_lookup_and_uniqueness() {
    require_emulator!();

    let db = test_db().await;
    let sub = format!("sub-{}", unique_suffix());
    let user = db.create_user(UserFields::default()).await.unwrap();

    let before = db
        .get_user_by_account(&AccountRef::new("rollup", &sub))
        .await
        .unwrap();
    assert!(before.is_none());

    db.create_linked_account(&account_for(&user.id, &sub))
        .await
        .unwrap();

    let found = db
        .get_user_by_account(&AccountRef::new("rollup", &sub))
        .await
        .unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id.clone()));

    let err = db
        .create_linked_account(&account_for("someone-else", &sub))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    println!("✓ Linked account verified: sub={}", sub);
}

#[tokio::test]
async fn test_offline_store_reports_database_error() {
    let db = FirestoreDb::new_mock();

    let err = db.get_user("any").await.unwrap_err();
    assert!(matches!(err, AppError::Database(_)));
}
