// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for signed-in users.

use crate::middleware::auth::Session;
use crate::services::session::SessionUser;
use crate::time_utils::format_unix_rfc3339;
use crate::AppState;
use axum::{routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require a session).
/// The session middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/session", get(get_session))
}

/// Current session response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub user: SessionUser,
    /// Session expiry (RFC3339)
    pub expires: String,
}

async fn get_session(Extension(session): Extension<Session>) -> Json<SessionResponse> {
    Json(SessionResponse {
        user: session.user,
        expires: format_unix_rfc3339(session.expires).unwrap_or_default(),
    })
}
