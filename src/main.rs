// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rollup-Auth API Server
//!
//! Signs users in with Rollup ID and keeps their identities in Firestore
//! (or in memory for local development).

use rollup_auth::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryDb, UserQueries},
    services::{rollup, AuthOptions, OAuthUserConfig, OidcClient, SessionStrategy, StoreAdapter},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Rollup-Auth API");

    // Identity store backend
    let queries: Arc<dyn UserQueries> = match config.store {
        StoreBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory identity store; identities are lost on restart");
            Arc::new(MemoryDb::new())
        }
    };
    let adapter = Arc::new(StoreAdapter::new(queries));

    let provider = Arc::new(rollup(OAuthUserConfig {
        client_id: config.rollup_client_id.clone(),
        client_secret: config.rollup_client_secret.clone(),
        ..Default::default()
    }));

    // Incompatible adapter/strategy combinations fail here, not at sign-in
    let auth = AuthOptions::new(adapter, provider.clone(), SessionStrategy::Jwt)?;

    let oidc = Arc::new(OidcClient::new(provider)?);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        auth,
        oidc,
    });

    // Build router
    let app = rollup_auth::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rollup_auth=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
