// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity store adapter.
//!
//! [`Adapter`] is the capability set the sign-in flow and the session
//! callback work against. Optional capabilities (user deletion, account
//! unlinking, verification tokens) are separate traits exposed through
//! `Option` slots, so their absence can be inspected when the auth options
//! are composed instead of surfacing as a runtime failure.

use crate::db::UserQueries;
use crate::error::{AppError, Result};
use crate::models::{
    AccountRef, AdapterSession, LinkedAccount, NewUser, SessionPatch, User, UserPatch,
    VerificationToken,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Operations every adapter must provide.
#[async_trait]
pub trait Adapter: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn get_user(&self, id: &str) -> Result<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn get_user_by_account(&self, account: &AccountRef) -> Result<Option<User>>;

    async fn update_user(&self, user: UserPatch) -> Result<User>;

    async fn link_account(&self, account: LinkedAccount) -> Result<()>;

    async fn create_session(&self, session: AdapterSession) -> Result<AdapterSession>;

    async fn get_session_and_user(
        &self,
        session_token: &str,
    ) -> Result<Option<(AdapterSession, User)>>;

    async fn update_session(&self, session: SessionPatch) -> Result<Option<AdapterSession>>;

    async fn delete_session(&self, session_token: &str) -> Result<Option<AdapterSession>>;

    /// Whether the session methods above are backed by storage.
    fn persists_sessions(&self) -> bool {
        true
    }

    fn user_deletion(&self) -> Option<&dyn UserDeletion> {
        None
    }

    fn account_unlinking(&self) -> Option<&dyn AccountUnlinking> {
        None
    }

    fn verification_tokens(&self) -> Option<&dyn VerificationTokenStore> {
        None
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            delete_user: self.user_deletion().is_some(),
            unlink_account: self.account_unlinking().is_some(),
            verification_tokens: self.verification_tokens().is_some(),
            database_sessions: self.persists_sessions(),
        }
    }
}

#[async_trait]
pub trait UserDeletion: Send + Sync {
    async fn delete_user(&self, id: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait AccountUnlinking: Send + Sync {
    async fn unlink_account(&self, account: &AccountRef) -> Result<()>;
}

#[async_trait]
pub trait VerificationTokenStore: Send + Sync {
    async fn create_verification_token(
        &self,
        token: VerificationToken,
    ) -> Result<Option<VerificationToken>>;

    async fn use_verification_token(
        &self,
        identifier: &str,
        token: &str,
    ) -> Result<Option<VerificationToken>>;
}

/// Which optional parts of the adapter interface are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub delete_user: bool,
    pub unlink_account: bool,
    pub verification_tokens: bool,
    pub database_sessions: bool,
}

/// Adapter over the stored user/account queries.
///
/// Users and accounts only; sessions are signed tokens, so the session
/// methods always fail with `NotImplemented`.
#[derive(Clone)]
pub struct StoreAdapter {
    queries: Arc<dyn UserQueries>,
}

impl StoreAdapter {
    pub fn new(queries: Arc<dyn UserQueries>) -> Self {
        Self { queries }
    }
}

#[async_trait]
impl Adapter for StoreAdapter {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        if let Some(err) = AppError::unsupported("user", user.extra.keys()) {
            return Err(err);
        }

        let user = self.queries.create_user(user.fields).await?;
        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.queries.get_user(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.queries.get_user_by_email(email).await
    }

    async fn get_user_by_account(&self, account: &AccountRef) -> Result<Option<User>> {
        self.queries.get_user_by_account(account).await
    }

    async fn update_user(&self, user: UserPatch) -> Result<User> {
        if let Some(err) = AppError::unsupported("user", user.extra.keys()) {
            return Err(err);
        }

        self.queries
            .update_user(&user.id, user.fields)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", user.id)))
    }

    async fn link_account(&self, account: LinkedAccount) -> Result<()> {
        if let Some(err) = AppError::unsupported("account", account.extra.keys()) {
            return Err(err);
        }

        self.queries.create_linked_account(&account.record).await?;
        tracing::info!(
            user_id = %account.record.user_id,
            provider = %account.record.provider,
            "Account linked"
        );
        Ok(())
    }

    async fn create_session(&self, _session: AdapterSession) -> Result<AdapterSession> {
        Err(AppError::NotImplemented("createSession"))
    }

    async fn get_session_and_user(
        &self,
        _session_token: &str,
    ) -> Result<Option<(AdapterSession, User)>> {
        Err(AppError::NotImplemented("getSessionAndUser"))
    }

    async fn update_session(&self, _session: SessionPatch) -> Result<Option<AdapterSession>> {
        Err(AppError::NotImplemented("updateSession"))
    }

    async fn delete_session(&self, _session_token: &str) -> Result<Option<AdapterSession>> {
        Err(AppError::NotImplemented("deleteSession"))
    }

    fn persists_sessions(&self) -> bool {
        false
    }
}
