// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth sign-in: map a provider profile onto a stored user.

use crate::error::{AppError, Result};
use crate::models::{AccountRef, AccountType, LinkedAccountRecord, Profile, User, UserPatch};
use crate::services::adapter::Adapter;
use crate::services::oidc::TokenSet;
use crate::services::rollup::{ProviderType, RollupProvider};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-account locks serializing sign-ins for the same provider identity
/// within this instance.
pub type SignInLocks = Arc<DashMap<AccountRef, Arc<Mutex<()>>>>;

/// Resolve or create the user for a completed OAuth exchange.
///
/// 1. A linked account wins; its user gets the fresh profile fields.
/// 2. An unlinked account whose email matches an existing user is refused.
/// 3. Otherwise a new user is created and the account linked to it.
///
/// If the link is refused because another sign-in linked the same identity
/// first, the already-linked user is returned and the new user removed.
pub async fn complete_sign_in(
    adapter: &dyn Adapter,
    locks: &SignInLocks,
    provider: &RollupProvider,
    profile: &Profile,
    tokens: &TokenSet,
) -> Result<User> {
    let account_ref = AccountRef::new(provider.id, &profile.id);

    let lock = locks
        .entry(account_ref.clone())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone();
    let result = {
        let _guard = lock.lock().await;
        resolve_user(adapter, &account_ref, provider, profile, tokens).await
    };

    // Only the map and this call hold the lock when nobody is waiting.
    locks.remove_if(&account_ref, |_, l| Arc::strong_count(l) <= 2);

    result
}

async fn resolve_user(
    adapter: &dyn Adapter,
    account_ref: &AccountRef,
    provider: &RollupProvider,
    profile: &Profile,
    tokens: &TokenSet,
) -> Result<User> {
    if let Some(user) = adapter.get_user_by_account(account_ref).await? {
        tracing::debug!(user_id = %user.id, "Returning user, refreshing profile");
        return adapter
            .update_user(UserPatch::new(user.id, profile.user_fields()))
            .await;
    }

    if let Some(email) = profile.email.as_deref() {
        if let Some(existing) = adapter.get_user_by_email(email).await? {
            tracing::warn!(
                user_id = %existing.id,
                provider = provider.id,
                "Email already belongs to a user without this provider link"
            );
            return Err(AppError::AccountNotLinked(format!(
                "sign in with the provider originally used for this email; {} is not linked",
                provider.name
            )));
        }
    }

    if !profile.extensions.is_empty() {
        tracing::debug!(
            provider = provider.id,
            "Profile extensions are not stored by the identity store"
        );
    }

    let user = adapter.create_user(profile.to_new_user()).await?;

    let account = LinkedAccountRecord {
        account_type: match provider.provider_type {
            ProviderType::Oauth => AccountType::Oauth,
            ProviderType::Oidc => AccountType::Oidc,
        },
        provider: provider.id.to_string(),
        provider_account_id: profile.id.clone(),
        access_token: tokens.access_token.clone(),
        refresh_token: tokens.refresh_token.clone(),
        id_token: tokens.id_token.clone(),
        expires_at: tokens.expires_at,
        token_type: tokens.token_type.clone(),
        scope: tokens.scope.clone(),
        session_state: tokens.session_state.clone(),
        user_id: user.id.clone(),
    };
    let linked = adapter.link_account(account.into()).await;
    let Err(e) = linked else {
        return Ok(user);
    };

    discard_orphan(adapter, &user).await;
    match e {
        AppError::Conflict(msg) => {
            tracing::warn!(
                provider = provider.id,
                "Account linked concurrently, using existing link: {}",
                msg
            );
            adapter
                .get_user_by_account(account_ref)
                .await?
                .ok_or(AppError::Conflict(msg))
        }
        e => Err(e),
    }
}

/// Remove a user created for a link that did not happen.
async fn discard_orphan(adapter: &dyn Adapter, user: &User) {
    let Some(deletion) = adapter.user_deletion() else {
        tracing::warn!(
            user_id = %user.id,
            "Orphaned user left behind; adapter cannot delete users"
        );
        return;
    };
    if let Err(e) = deletion.delete_user(&user.id).await {
        tracing::error!(user_id = %user.id, error = %e, "Failed to delete orphaned user");
    }
}
