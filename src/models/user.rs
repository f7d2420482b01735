// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and the adapter interface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User record as stored and returned by the adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Store-assigned identifier (also used as document ID)
    pub id: String,
    pub email: Option<String>,
    /// When the email address was verified, if ever
    pub email_verified: Option<DateTime<Utc>>,
    pub name: Option<String>,
    /// Profile picture URL
    pub image: Option<String>,
}

/// The allow-listed, persistable part of a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFields {
    pub email: Option<String>,
    pub email_verified: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl User {
    /// Assemble a stored user from its id and fields.
    pub fn from_fields(id: String, fields: UserFields) -> Self {
        Self {
            id,
            email: fields.email,
            email_verified: fields.email_verified,
            name: fields.name,
            image: fields.image,
        }
    }

    /// Overwrite every attribute that is present in `changes`.
    pub fn apply(&mut self, changes: UserFields) {
        if let Some(email) = changes.email {
            self.email = Some(email);
        }
        if let Some(verified) = changes.email_verified {
            self.email_verified = Some(verified);
        }
        if let Some(name) = changes.name {
            self.name = Some(name);
        }
        if let Some(image) = changes.image {
            self.image = Some(image);
        }
    }
}

/// Inbound user without an id, as handed over by the sign-in flow.
///
/// Any property outside the allow-list lands in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(flatten)]
    pub fields: UserFields,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewUser {
    pub fn new(fields: UserFields) -> Self {
        Self {
            fields,
            extra: Map::new(),
        }
    }
}

/// Partial user update. `id` is required, every other attribute is optional
/// and left unchanged when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub id: String,
    #[serde(flatten)]
    pub fields: UserFields,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserPatch {
    pub fn new(id: impl Into<String>, fields: UserFields) -> Self {
        Self {
            id: id.into(),
            fields,
            extra: Map::new(),
        }
    }
}
