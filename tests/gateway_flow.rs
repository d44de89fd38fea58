// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! End-to-end: client -> gateway -> auth / payment services over loopback.

use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use axum::Router;
use paylite::{
    api::{auth_router, payment_router},
    auth::TokenCodec,
    config::GatewayConfig,
    gateway::{gateway_router, gateway_state, proxy::UPSTREAM_TIMEOUT, GATEWAY_REQUEST_TIMEOUT},
    providers::{CreatedOrder, OrderRequest, PaymentProcessor, RazorpayError},
    server::serve_listener,
    state::{AuthState, PaymentState},
    storage::{open_database, RedbCredentialStore, RedbPaymentStore},
};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

const SECRET: &str = "integration-secret";
const ORIGIN: &str = "http://localhost:3000";

struct StubProcessor;

#[async_trait]
impl PaymentProcessor for StubProcessor {
    async fn create_order(&self, order: &OrderRequest) -> Result<CreatedOrder, RazorpayError> {
        Ok(CreatedOrder {
            id: format!("order_stub_{}", order.amount),
            status: Some("created".into()),
        })
    }
}

struct Platform {
    gateway: String,
    payment_shutdown: CancellationToken,
    shutdown: CancellationToken,
    _dir: tempfile::TempDir,
}

impl Drop for Platform {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.payment_shutdown.cancel();
    }
}

async fn spawn(router: Router, shutdown: CancellationToken) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_listener("test", router, listener, shutdown));
    addr
}

async fn start_platform() -> Platform {
    let dir = tempfile::tempdir().unwrap();
    let shutdown = CancellationToken::new();
    let payment_shutdown = CancellationToken::new();
    let origins = vec![ORIGIN.to_string()];

    let auth_db = open_database(&dir.path().join("auth.redb")).unwrap();
    let auth_state = AuthState::new(
        TokenCodec::new(SECRET),
        Arc::new(RedbCredentialStore::open(auth_db).unwrap()),
    );
    let auth_addr = spawn(auth_router(auth_state, &origins), shutdown.clone()).await;

    let pay_db = open_database(&dir.path().join("payments.redb")).unwrap();
    let pay_state = PaymentState::new(
        TokenCodec::new(SECRET),
        Arc::new(RedbPaymentStore::open(pay_db).unwrap()),
        Arc::new(StubProcessor),
    );
    let pay_addr = spawn(payment_router(pay_state, &origins), payment_shutdown.clone()).await;

    let auth_url = format!("http://{auth_addr}");
    let pay_url = format!("http://{pay_addr}");
    let config = GatewayConfig::from_lookup(|name| match name {
        "AUTH_SERVICE_URL" => Some(auth_url.clone()),
        "PAYMENT_SERVICE_URL" => Some(pay_url.clone()),
        _ => None,
    })
    .unwrap();
    let gateway_addr = spawn(
        gateway_router(gateway_state(&config).unwrap()),
        shutdown.clone(),
    )
    .await;

    Platform {
        gateway: format!("http://{gateway_addr}"),
        payment_shutdown,
        shutdown,
        _dir: dir,
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn register_login_me_and_pay_through_gateway() {
    let platform = start_platform().await;
    let http = client();
    let gw = &platform.gateway;

    let register = http
        .post(format!("{gw}/api/v1/auth/register"))
        .json(&json!({"name": "A", "email": "a@x.com", "password": "secret"}))
        .send()
        .await
        .unwrap();
    assert_eq!(register.status(), StatusCode::CREATED);
    assert_eq!(register.headers()["cache-control"], "no-store, max-age=0");
    let body: Value = register.json().await.unwrap();
    assert_eq!(body["message"], "User registered successfully");

    let wrong = http
        .post(format!("{gw}/api/v1/auth/login"))
        .json(&json!({"email": "a@x.com", "password": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let body: Value = wrong.json().await.unwrap();
    assert_eq!(body, json!({"message": "Invalid email or password"}));

    let login = http
        .post(format!("{gw}/api/v1/auth/login"))
        .json(&json!({"email": "a@x.com", "password": "secret"}))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);
    let body: Value = login.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    let me: Value = http
        .get(format!("{gw}/api/v1/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["email"], "a@x.com");
    let user_id = me["user_id"].as_i64().unwrap();

    let pay = http
        .post(format!("{gw}/api/v1/pay"))
        .bearer_auth(&token)
        .json(&json!({"amount": 49.99, "from_account": "acc-1", "to_account": "acc-2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(pay.status(), StatusCode::CREATED);
    let payment: Value = pay.json().await.unwrap();
    assert_eq!(payment["razorpay_order_id"], "order_stub_4999");
    assert_eq!(payment["status"], "created");

    let listing: Value = http
        .get(format!("{gw}/api/v1/payments"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["payments"][0]["id"], payment["id"]);

    let claims = TokenCodec::new(SECRET).verify(&token).unwrap();
    assert_eq!(claims.user_id, user_id);
}

#[tokio::test]
async fn gateway_owns_cors_headers() {
    let platform = start_platform().await;
    let http = client();

    let preflight = http
        .request(
            reqwest::Method::OPTIONS,
            format!("{}/api/v1/auth/login", platform.gateway),
        )
        .header("origin", ORIGIN)
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();
    assert_eq!(preflight.status(), StatusCode::NO_CONTENT);
    assert_eq!(preflight.headers()["access-control-allow-origin"], ORIGIN);

    let response = http
        .post(format!("{}/api/v1/auth/login", platform.gateway))
        .header("origin", ORIGIN)
        .json(&json!({"email": "", "password": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let origins: Vec<_> = response
        .headers()
        .get_all("access-control-allow-origin")
        .iter()
        .collect();
    assert_eq!(origins.len(), 1);
    assert_eq!(origins[0], ORIGIN);
}

#[tokio::test]
async fn protected_payment_route_requires_token() {
    let platform = start_platform().await;

    let response = client()
        .post(format!("{}/api/v1/pay", platform.gateway))
        .json(&json!({"amount": 1, "from_account": "a", "to_account": "b"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn stopped_backend_yields_502() {
    let platform = start_platform().await;
    platform.payment_shutdown.cancel();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let response = client()
        .post(format!("{}/api/v1/pay", platform.gateway))
        .json(&json!({"amount": 1, "from_account": "a", "to_account": "b"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "service_unavailable");
    assert_eq!(body["message"], "Backend service not responding");
}

#[tokio::test]
async fn silent_backend_yields_502_not_a_timeout_status() {
    let silent = Router::new().fallback(|| async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        "too late"
    });
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let silent_addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, silent).await.unwrap();
    });

    let shutdown = CancellationToken::new();
    let silent_url = format!("http://{silent_addr}");
    let config = GatewayConfig::from_lookup(|name| match name {
        "PAYMENT_SERVICE_URL" => Some(silent_url.clone()),
        _ => None,
    })
    .unwrap();
    let gateway_addr = spawn(
        gateway_router(gateway_state(&config).unwrap()),
        shutdown.clone(),
    )
    .await;

    let started = Instant::now();
    let response = client()
        .post(format!("http://{gateway_addr}/api/v1/pay"))
        .json(&json!({"amount": 1, "from_account": "a", "to_account": "b"}))
        .send()
        .await
        .unwrap();
    let elapsed = started.elapsed();
    shutdown.cancel();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({"error": "service_unavailable", "message": "Backend service not responding"})
    );
    assert!(elapsed >= UPSTREAM_TIMEOUT);
    assert!(elapsed < GATEWAY_REQUEST_TIMEOUT);
}
