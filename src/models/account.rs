// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Linked provider accounts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Connection kind of a linked account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Oauth,
    Oidc,
    Email,
    Credentials,
}

/// Reference to a linked account by provider identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRef {
    pub provider: String,
    pub provider_account_id: String,
}

impl AccountRef {
    pub fn new(provider: impl Into<String>, provider_account_id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            provider_account_id: provider_account_id.into(),
        }
    }

    /// Firestore document ID for this reference.
    ///
    /// Both parts are URL-encoded, so a raw `:` only ever appears as the
    /// separator.
    pub fn document_id(&self) -> String {
        format!(
            "{}:{}",
            urlencoding::encode(&self.provider),
            urlencoding::encode(&self.provider_account_id)
        )
    }
}

/// The allow-listed, persistable part of a linked account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedAccountRecord {
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub provider: String,
    #[serde(rename = "providerAccountId")]
    pub provider_account_id: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    /// Access token expiry (Unix seconds)
    pub expires_at: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub session_state: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: String,
}

impl LinkedAccountRecord {
    pub fn account_ref(&self) -> AccountRef {
        AccountRef::new(&self.provider, &self.provider_account_id)
    }
}

/// Inbound account link. Any property outside the record's field set lands
/// in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedAccount {
    #[serde(flatten)]
    pub record: LinkedAccountRecord,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<LinkedAccountRecord> for LinkedAccount {
    fn from(record: LinkedAccountRecord) -> Self {
        Self {
            record,
            extra: Map::new(),
        }
    }
}
