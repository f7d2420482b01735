// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rollup ID userinfo payload and the normalized provider profile.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::{NewUser, UserFields};

/// Validated userinfo response from Rollup ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RollupProfile {
    pub sub: String,
    pub name: String,
    #[validate(url)]
    pub picture: String,
    #[validate(email)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_accounts: Option<Vec<ConnectedAccount>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub erc_4337: Option<Vec<SmartContractWallet>>,
}

/// An external account connected to the Rollup identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedAccount {
    #[serde(rename = "type")]
    pub account_type: String,
    pub identifier: String,
}

/// ERC-4337 smart contract wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartContractWallet {
    pub nickname: String,
    pub address: String,
}

/// Provider-specific profile attributes that have no column in the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileExtensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_accounts: Option<Vec<ConnectedAccount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erc_4337: Option<Vec<SmartContractWallet>>,
}

impl ProfileExtensions {
    pub fn is_empty(&self) -> bool {
        self.connected_accounts.is_none() && self.erc_4337.is_none()
    }
}

/// Normalized profile produced by a provider's `profile` hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Provider subject; becomes the linked account's `providerAccountId`
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    #[serde(flatten)]
    pub extensions: ProfileExtensions,
}

impl Profile {
    /// Project onto the attributes the identity store accepts.
    pub fn user_fields(&self) -> UserFields {
        UserFields {
            email: self.email.clone(),
            email_verified: None,
            name: self.name.clone(),
            image: self.image.clone(),
        }
    }

    pub fn to_new_user(&self) -> NewUser {
        NewUser::new(self.user_fields())
    }
}
