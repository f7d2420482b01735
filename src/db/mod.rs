// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer: the query interface and its backends.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{AccountRef, LinkedAccountRecord, User, UserFields};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Linked accounts, keyed by `AccountRef::document_id`
    pub const ACCOUNTS: &str = "accounts";
}

/// Stored queries the identity store adapter delegates to.
///
/// Lookups return `Ok(None)` for absent records. Constraint enforcement
/// (such as one link per provider identity) belongs to the backend.
#[async_trait]
pub trait UserQueries: Send + Sync {
    /// Insert a user and assign its id.
    async fn create_user(&self, fields: UserFields) -> Result<User, AppError>;

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn get_user_by_account(&self, account: &AccountRef) -> Result<Option<User>, AppError>;

    /// Merge `changes` into the user; `None` when no user has that id.
    async fn update_user(&self, id: &str, changes: UserFields)
        -> Result<Option<User>, AppError>;

    /// Store a link. Fails with `Conflict` if the provider identity is
    /// already linked.
    async fn create_linked_account(&self, account: &LinkedAccountRecord) -> Result<(), AppError>;
}

/// New store-assigned user id.
pub(crate) fn new_user_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
