// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session callback: turns verified token claims into a session user.

use crate::error::{AppError, Result};
use crate::middleware::auth::SessionClaims;
use crate::services::adapter::Adapter;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User exposed on the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

/// Resolve the token subject against the identity store.
///
/// The id comes from the stored user; display fields come from the token.
pub async fn resolve_session(adapter: &dyn Adapter, claims: &SessionClaims) -> Result<SessionUser> {
    let sub = claims
        .sub
        .as_deref()
        .filter(|sub| !sub.is_empty())
        .ok_or_else(|| AppError::Unauthorized("no sub in token".to_string()))?;

    let user = adapter
        .get_user(sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("user not found".to_string()))?;

    Ok(SessionUser {
        id: user.id,
        name: claims.name.clone(),
        email: claims.email.clone(),
        image: claims.picture.clone(),
    })
}
