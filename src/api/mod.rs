// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP routers of the backend services.
//!
//! | Service | Route | Auth |
//! |---------|-------|------|
//! | auth | `POST /api/v1/register`, `POST /api/v1/login` | none |
//! | auth | `GET /api/v1/me` | bearer (checked in handler) |
//! | payment | `POST /api/v1/pay`, `GET /api/v1/payments` | bearer (middleware) |
//! | both | `GET /`, `GET /health`, `/docs` | none |

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::middleware::require_identity,
    models::{
        AuthResponse, CreatePaymentRequest, ErrorResponse, LoginRequest, MeResponse,
        PaymentListResponse, PaymentResponse, RegisterRequest,
    },
    server::REQUEST_TIMEOUT,
    state::{AuthState, PaymentState},
    storage::PaymentStatus,
};

pub mod auth;
pub mod health;
pub mod payments;

pub fn auth_router(state: AuthState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(health::auth_banner))
        .route("/health", get(health::health))
        .route("/api/v1/register", post(auth::register))
        .route("/api/v1/login", post(auth::login))
        .route("/api/v1/me", get(auth::me))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", AuthApiDoc::openapi()))
        .layer(cors_layer(allowed_origins))
        .layer(request_timeout())
}

pub fn payment_router(state: PaymentState, allowed_origins: &[String]) -> Router {
    let protected = Router::new()
        .route("/api/v1/pay", post(payments::create_payment))
        .route("/api/v1/payments", get(payments::list_payments))
        .route_layer(middleware::from_fn_with_state(
            state.codec.clone(),
            require_identity,
        ));

    Router::new()
        .route("/", get(health::payment_banner))
        .route("/health", get(health::health))
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", PaymentApiDoc::openapi()))
        .layer(cors_layer(allowed_origins))
        .layer(request_timeout())
}

fn request_timeout() -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, REQUEST_TIMEOUT)
}

/// CORS for direct (non-gateway) browser access to a backend.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Paylite Auth Service", description = "User registration, login and token identity"),
    paths(health::health, auth::register, auth::login, auth::me),
    components(schemas(RegisterRequest, LoginRequest, AuthResponse, MeResponse)),
    modifiers(&BearerSecurity),
    tags(
        (name = "Auth", description = "Registration, login and identity"),
        (name = "Health", description = "Liveness")
    )
)]
pub struct AuthApiDoc;

#[derive(OpenApi)]
#[openapi(
    info(title = "Paylite Payment Service", description = "Payment order creation"),
    paths(health::health, payments::create_payment, payments::list_payments),
    components(schemas(
        CreatePaymentRequest,
        PaymentResponse,
        PaymentListResponse,
        PaymentStatus,
        ErrorResponse
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = "Payments", description = "Payment orders"),
        (name = "Health", description = "Liveness")
    )
)]
pub struct PaymentApiDoc;
