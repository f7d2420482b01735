// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

/// Which backend holds users and linked accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    /// In-process maps; contents are lost on restart
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Rollup ID OAuth client ID (public)
    pub rollup_client_id: String,
    /// Frontend URL to land on after sign-in
    pub frontend_url: String,
    /// Public base URL of this API (OAuth callback host)
    pub api_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Identity store backend
    pub store: StoreBackend,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// Rollup ID OAuth client secret
    pub rollup_client_secret: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for the OAuth state parameter
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store = match env::var("IDENTITY_STORE").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("firestore") | Err(_) => StoreBackend::Firestore,
            Ok(other) => {
                return Err(ConfigError::Invalid(format!(
                    "IDENTITY_STORE must be \"firestore\" or \"memory\", got {other:?}"
                )))
            }
        };

        Ok(Self {
            rollup_client_id: env::var("ROLLUP_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("ROLLUP_CLIENT_ID"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            api_url: env::var("API_URL").unwrap_or_else(|_| "http://localhost:8080".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            store,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),

            rollup_client_secret: env::var("ROLLUP_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("ROLLUP_CLIENT_SECRET"))?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),
        })
    }

    /// Config for tests: in-memory store, fixed keys.
    pub fn test_default() -> Self {
        Self {
            rollup_client_id: "test_client_id".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            api_url: "http://localhost:8080".to_string(),
            gcp_project_id: "test-project".to_string(),
            store: StoreBackend::Memory,
            port: 8080,
            rollup_client_secret: "test_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
        }
    }

    /// Redirect URI registered with Rollup ID.
    pub fn callback_url(&self) -> String {
        format!("{}/auth/callback/rollup", self.api_url.trim_end_matches('/'))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("ROLLUP_CLIENT_ID", "test_id");
        env::set_var("ROLLUP_CLIENT_SECRET", " test_secret\n");
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("OAUTH_STATE_KEY", "test_state_key");
        env::remove_var("IDENTITY_STORE");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.rollup_client_id, "test_id");
        assert_eq!(config.rollup_client_secret, "test_secret");
        assert_eq!(config.store, StoreBackend::Firestore);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn callback_url_strips_trailing_slash() {
        let mut config = Config::test_default();
        config.api_url = "https://auth.example.com/".to_string();
        assert_eq!(
            config.callback_url(),
            "https://auth.example.com/auth/callback/rollup"
        );
    }
}
