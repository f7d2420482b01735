// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Rollup-Auth: Rollup ID sign-in backed by an identity store adapter
//!
//! This crate provides the identity store adapter (users and linked
//! accounts), the Rollup ID OAuth provider definition, and the HTTP routes
//! that compose them into a JWT-session sign-in service.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{AuthOptions, OidcClient};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub auth: AuthOptions,
    pub oidc: Arc<OidcClient>,
}
