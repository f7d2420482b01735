// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process backend for local development and tests.

use crate::db::{new_user_id, UserQueries};
use crate::error::AppError;
use crate::models::{AccountRef, LinkedAccountRecord, User, UserFields};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Users and linked accounts held in concurrent maps. Clones share storage.
#[derive(Clone, Default)]
pub struct MemoryDb {
    users: Arc<DashMap<String, User>>,
    accounts: Arc<DashMap<AccountRef, LinkedAccountRecord>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

#[async_trait]
impl UserQueries for MemoryDb {
    async fn create_user(&self, fields: UserFields) -> Result<User, AppError> {
        let user = User::from_fields(new_user_id(), fields);
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .map(|u| u.value().clone()))
    }

    async fn get_user_by_account(&self, account: &AccountRef) -> Result<Option<User>, AppError> {
        let Some(user_id) = self.accounts.get(account).map(|a| a.user_id.clone()) else {
            return Ok(None);
        };
        self.get_user(&user_id).await
    }

    async fn update_user(
        &self,
        id: &str,
        changes: UserFields,
    ) -> Result<Option<User>, AppError> {
        Ok(self.users.get_mut(id).map(|mut user| {
            user.apply(changes);
            user.clone()
        }))
    }

    async fn create_linked_account(&self, account: &LinkedAccountRecord) -> Result<(), AppError> {
        match self.accounts.entry(account.account_ref()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "{} account {} is already linked",
                account.provider, account.provider_account_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(account.clone());
                Ok(())
            }
        }
    }
}
