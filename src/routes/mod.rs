// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod api;
pub mod auth;

use crate::config::{Config, StoreBackend};
use crate::middleware::{require_session, security::add_security_headers};
use crate::AppState;
use axum::extract::State;
use axum::http::{header, request::Parts, HeaderValue, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub build_id: &'static str,
    /// Sign-in provider id
    pub provider: &'static str,
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        build_id: option_env!("BUILD_ID").unwrap_or("unknown"),
        provider: state.auth.provider.id,
    })
}

/// The frontend may call the session endpoint with credentials. Local
/// origins are only trusted with the in-memory (development) store.
fn cors_layer(config: &Config) -> CorsLayer {
    let frontend_url = config.frontend_url.trim_end_matches('/').to_string();
    let allow_local = config.store == StoreBackend::Memory;

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                let origin = origin.to_str().unwrap_or("");
                origin == frontend_url
                    || (allow_local
                        && (origin.starts_with("http://localhost")
                            || origin.starts_with("http://127.0.0.1")))
            },
        ))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::ACCEPT])
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let session_routes =
        api::routes().route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes())
        .merge(session_routes)
        .layer(middleware::from_fn(add_security_headers))
        .layer(cors_layer(&state.config))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
