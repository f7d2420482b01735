// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth options: the adapter, the provider and the session strategy,
//! checked for compatibility once at startup.

use crate::config::ConfigError;
use crate::services::adapter::Adapter;
use crate::services::rollup::RollupProvider;
use crate::services::signin::SignInLocks;
use std::sync::Arc;
use std::time::Duration;

/// Session lifetime for signed session tokens.
pub const SESSION_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStrategy {
    /// Signed token held by the client
    Jwt,
    /// Session rows persisted through the adapter
    Database,
}

/// Validated composition of the auth components.
#[derive(Clone)]
pub struct AuthOptions {
    pub adapter: Arc<dyn Adapter>,
    pub provider: Arc<RollupProvider>,
    pub session_strategy: SessionStrategy,
    /// Shared across requests so concurrent callbacks for one identity
    /// create a single user.
    pub sign_in_locks: SignInLocks,
}

impl AuthOptions {
    pub fn new(
        adapter: Arc<dyn Adapter>,
        provider: Arc<RollupProvider>,
        session_strategy: SessionStrategy,
    ) -> Result<Self, ConfigError> {
        let capabilities = adapter.capabilities();

        if session_strategy == SessionStrategy::Database && !capabilities.database_sessions {
            return Err(ConfigError::Invalid(
                "database sessions require an adapter that persists sessions".to_string(),
            ));
        }

        if provider.client_id.is_empty() || provider.client_secret.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "{} provider is missing client credentials",
                provider.name
            )));
        }

        tracing::info!(
            provider = provider.id,
            strategy = ?session_strategy,
            capabilities = ?capabilities,
            "Auth options composed"
        );

        Ok(Self {
            adapter,
            provider,
            session_strategy,
            sign_in_locks: SignInLocks::default(),
        })
    }
}
