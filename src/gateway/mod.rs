// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Gateway
//!
//! Single public entry point in front of the backend services.
//!
//! ## Route Table
//!
//! Checked in order, first match wins:
//!
//! | Inbound prefix | Backend | Rewrite |
//! |----------------|---------|---------|
//! | `/api/v1/auth/` | auth service | `/api/v1/auth` → `/api/v1` |
//! | `/api/v1/pay` | payment service | `/api/v1` → `/api/v1` |
//!
//! `GET /health` is answered locally. Anything else is a 404.
//!
//! A backend that stays silent for [`proxy::UPSTREAM_TIMEOUT`] is reported
//! as a 502 by the proxy. The outer [`GATEWAY_REQUEST_TIMEOUT`] only bounds
//! slow clients and must stay above it.

use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::timeout::TimeoutLayer;

use crate::{
    api::health,
    config::GatewayConfig,
    error::ApiError,
    state::GatewayState,
};

pub mod cors;
pub mod proxy;

use cors::{apply_cors, CorsPolicy};
use proxy::{ReverseProxy, RouteRule, MAX_FORWARD_BODY_BYTES};

/// Whole-request limit at the gateway, body upload included.
pub const GATEWAY_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Route rules for the configured backends.
pub fn route_table(config: &GatewayConfig) -> Vec<RouteRule> {
    vec![
        RouteRule::new(
            "auth",
            "/api/v1/auth/",
            "/api/v1/auth",
            "/api/v1",
            config.auth_service_url.clone(),
        ),
        RouteRule::new(
            "payment",
            "/api/v1/pay",
            "/api/v1",
            "/api/v1",
            config.payment_service_url.clone(),
        ),
    ]
}

pub fn gateway_state(config: &GatewayConfig) -> Result<GatewayState, reqwest::Error> {
    Ok(GatewayState {
        proxy: ReverseProxy::new(route_table(config))?,
        cors: CorsPolicy::new(config.allowed_origins.clone()),
    })
}

pub fn gateway_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .fallback(dispatch)
        .layer(DefaultBodyLimit::max(MAX_FORWARD_BODY_BYTES))
        .layer(middleware::from_fn_with_state(state.cors.clone(), apply_cors))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            GATEWAY_REQUEST_TIMEOUT,
        ))
        .with_state(state)
}

async fn dispatch(State(proxy): State<ReverseProxy>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    match proxy.route_for(&path) {
        Some(rule) => proxy.forward(rule, request).await,
        None => {
            tracing::debug!(path = %path, "no gateway route");
            ApiError::not_found(format!("No route for {path}")).into_response()
        }
    }
}
