// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Razorpay order creation.
//!
//! The payment service only needs one call: `POST /v1/orders` with HTTP
//! basic auth (`key_id:key_secret`). The response's `id` becomes the
//! payment record's `razorpay_order_id`.

use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::RazorpayCredentials;

const ORDERS_PATH: &str = "/v1/orders";

/// Order payload in the processor's wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    /// Amount in minor units (paise for INR)
    pub amount: u64,
    pub currency: String,
    pub receipt: String,
    pub notes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedOrder {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RazorpayError {
    #[error("Razorpay request failed: {0}")]
    Request(String),

    #[error("Razorpay rejected the order: {0}")]
    Rejected(String),

    #[error("Razorpay response was invalid: {0}")]
    InvalidResponse(String),
}

/// Remote order API.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_order(&self, order: &OrderRequest) -> Result<CreatedOrder, RazorpayError>;
}

#[derive(Clone)]
pub struct RazorpayClient {
    api_base_url: String,
    key_id: String,
    key_secret: String,
    http: Client,
}

impl RazorpayClient {
    pub fn new(credentials: RazorpayCredentials) -> Result<Self, RazorpayError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| RazorpayError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_base_url: credentials.api_base_url,
            key_id: credentials.key_id,
            key_secret: credentials.key_secret,
            http,
        })
    }
}

impl std::fmt::Debug for RazorpayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayClient")
            .field("api_base_url", &self.api_base_url)
            .field("key_id", &self.key_id)
            .field("key_secret", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl PaymentProcessor for RazorpayClient {
    async fn create_order(&self, order: &OrderRequest) -> Result<CreatedOrder, RazorpayError> {
        let url = format!("{}{}", self.api_base_url.trim_end_matches('/'), ORDERS_PATH);

        let response = self
            .http
            .post(url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(order)
            .send()
            .await
            .map_err(|e| RazorpayError::Request(format!("POST {ORDERS_PATH} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RazorpayError::Rejected(format!(
                "POST {ORDERS_PATH} returned {status}: {body}"
            )));
        }

        let created: CreatedOrder = response.json().await.map_err(|e| {
            RazorpayError::InvalidResponse(format!("POST {ORDERS_PATH} invalid JSON: {e}"))
        })?;

        if created.id.trim().is_empty() {
            return Err(RazorpayError::InvalidResponse(
                "missing order id in response".to_string(),
            ));
        }

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    async fn spawn_processor(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Vec<(HeaderMap, Value)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let app = Router::new().route(
            "/v1/orders",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let captured = captured.clone();
                let reply = reply.clone();
                async move {
                    captured.lock().unwrap().push((headers, body));
                    (status, Json(reply))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    fn client(base: String) -> RazorpayClient {
        RazorpayClient::new(RazorpayCredentials {
            key_id: "rzp_test_key".into(),
            key_secret: "rzp_test_secret".into(),
            api_base_url: base,
        })
        .unwrap()
    }

    fn order() -> OrderRequest {
        OrderRequest {
            amount: 12_550,
            currency: "INR".into(),
            receipt: "order_7_1750000000".into(),
            notes: BTreeMap::from([
                ("from_account".to_string(), "acc-a".to_string()),
                ("to_account".to_string(), "acc-b".to_string()),
            ]),
        }
    }

    #[tokio::test]
    async fn posts_order_with_basic_auth() {
        let (base, seen) =
            spawn_processor(StatusCode::OK, json!({"id": "order_Xyz", "status": "created"})).await;

        let created = client(base).create_order(&order()).await.unwrap();
        assert_eq!(created.id, "order_Xyz");

        let seen = seen.lock().unwrap();
        let (headers, body) = &seen[0];
        let auth = headers.get("authorization").unwrap().to_str().unwrap();
        assert!(auth.starts_with("Basic "));
        assert_eq!(body["amount"], 12_550);
        assert_eq!(body["receipt"], "order_7_1750000000");
        assert_eq!(body["notes"]["to_account"], "acc-b");
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (base, _) = spawn_processor(
            StatusCode::BAD_REQUEST,
            json!({"error": {"description": "amount too small"}}),
        )
        .await;

        let err = client(base).create_order(&order()).await.unwrap_err();
        assert!(matches!(err, RazorpayError::Rejected(msg) if msg.contains("400")));
    }

    #[tokio::test]
    async fn unreachable_processor_is_request_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{addr}")).create_order(&order()).await.unwrap_err();
        assert!(matches!(err, RazorpayError::Request(_)));
    }

    #[test]
    fn debug_hides_secret() {
        let rendered = format!("{:?}", client("http://localhost".into()));
        assert!(!rendered.contains("rzp_test_secret"));
    }
}
