// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reverse proxy with prefix rewriting.
//!
//! ## Request Transformation
//!
//! - Path: if it starts with the rule's `from_prefix`, that prefix is
//!   replaced by `to_prefix` (plain string prefix, no patterns)
//! - Scheme, host and `Host` header: taken from the backend URL
//! - `X-Forwarded-Host` from the client is dropped; `X-Forwarded-For` is
//!   set to the immediate peer address
//! - Hop-by-hop headers are never forwarded
//!
//! ## Response Transformation
//!
//! - Backend CORS headers are removed (the gateway owns CORS)
//! - Responses to `/api/` paths get `Cache-Control: no-store, max-age=0`
//! - Connection failures become a 502 JSON error; nothing is retried

use std::{net::SocketAddr, sync::Arc, time::Duration, time::Instant};

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, FromRequest, Request},
    http::{
        header::{self, HeaderName},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ApiError;

/// Largest request body the gateway buffers before forwarding.
pub const MAX_FORWARD_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Limit for one backend exchange, response body included.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const POOL_MAX_IDLE_PER_HOST: usize = 100;

const API_PREFIX: &str = "/api/";
const NO_STORE: &str = "no-store, max-age=0";
const BACKEND_UNAVAILABLE: &str = "Backend service not responding";

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Maps an inbound path prefix to a backend and a rewrite pair.
///
/// Built once at startup and shared read-only by every request.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub name: &'static str,
    /// Requests whose path starts with this are routed here
    pub match_prefix: String,
    pub from_prefix: String,
    pub to_prefix: String,
    pub backend: Url,
}

impl RouteRule {
    pub fn new(
        name: &'static str,
        match_prefix: impl Into<String>,
        from_prefix: impl Into<String>,
        to_prefix: impl Into<String>,
        backend: Url,
    ) -> Self {
        Self {
            name,
            match_prefix: match_prefix.into(),
            from_prefix: from_prefix.into(),
            to_prefix: to_prefix.into(),
            backend,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.match_prefix)
    }

    /// Replace `from_prefix` with `to_prefix`; other paths pass unchanged.
    pub fn rewrite_path(&self, path: &str) -> String {
        match path.strip_prefix(&self.from_prefix) {
            Some(rest) => format!("{}{}", self.to_prefix, rest),
            None => path.to_string(),
        }
    }

    /// Absolute backend URL for an already rewritten path.
    pub fn target_url(&self, rewritten_path: &str, query: Option<&str>) -> Url {
        let mut url = self.backend.clone();
        let base = self.backend.path().trim_end_matches('/');
        url.set_path(&format!("{base}{rewritten_path}"));
        url.set_query(query);
        url
    }

    /// `host[:port]` of the backend, used as the outbound `Host` header.
    pub fn backend_authority(&self) -> String {
        let host = self.backend.host_str().unwrap_or_default();
        match self.backend.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }
}

/// Forwards requests to backends using one pooled HTTP client.
#[derive(Clone)]
pub struct ReverseProxy {
    client: reqwest::Client,
    rules: Arc<Vec<RouteRule>>,
}

impl ReverseProxy {
    pub fn new(rules: Vec<RouteRule>) -> Result<Self, reqwest::Error> {
        Self::with_upstream_timeout(rules, UPSTREAM_TIMEOUT)
    }

    /// A backend that does not answer within `timeout` is reported as unavailable.
    pub fn with_upstream_timeout(
        rules: Vec<RouteRule>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            rules: Arc::new(rules),
        })
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// First rule whose prefix matches `path`.
    pub fn route_for(&self, path: &str) -> Option<&RouteRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    pub async fn forward(&self, rule: &RouteRule, request: Request) -> Response {
        let started = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let query = request.uri().query().map(str::to_string);
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let upstream_path = rule.rewrite_path(&path);
        if upstream_path != path {
            debug!(from = %path, to = %upstream_path, backend = rule.name, "rewrote path");
        }
        let target = rule.target_url(&upstream_path, query.as_deref());

        let inbound_headers = request.headers().clone();
        let body = match Bytes::from_request(request, &()).await {
            Ok(bytes) => bytes,
            Err(rejection) => {
                let status = rejection.status();
                warn!(method = %method, path = %path, status = status.as_u16(), error = %rejection.body_text(), "request body rejected");
                let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "Request body too large"
                } else {
                    "Request body could not be read"
                };
                return ApiError::bad_request(message).with_status(status).into_response();
            }
        };

        let mut headers = strip_hop_by_hop(&inbound_headers);
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(X_FORWARDED_HOST);
        if let Ok(host) = HeaderValue::from_str(&rule.backend_authority()) {
            headers.insert(header::HOST, host);
        }
        match peer.and_then(|ip| HeaderValue::from_str(&ip.to_string()).ok()) {
            Some(ip) => {
                headers.insert(X_FORWARDED_FOR, ip);
            }
            None => {
                headers.remove(X_FORWARDED_FOR);
            }
        }

        let upstream = self
            .client
            .request(method.clone(), target)
            .headers(headers)
            .body(body)
            .send()
            .await;

        let upstream = match upstream {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    method = %method,
                    path = %path,
                    backend = rule.name,
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "proxy error"
                );
                return backend_unavailable();
            }
        };

        let status = upstream.status();
        let mut response_headers = strip_hop_by_hop(upstream.headers());
        let body = match upstream.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(method = %method, path = %path, backend = rule.name, error = %e, "proxy error reading backend body");
                return backend_unavailable();
            }
        };

        response_headers.remove(header::ACCESS_CONTROL_ALLOW_ORIGIN);
        response_headers.remove(header::ACCESS_CONTROL_ALLOW_CREDENTIALS);
        response_headers.remove(header::ACCESS_CONTROL_EXPOSE_HEADERS);
        response_headers.remove(header::CONTENT_LENGTH);
        if path.starts_with(API_PREFIX) {
            response_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
        }

        info!(
            method = %method,
            path = %path,
            upstream_path = %upstream_path,
            backend = rule.name,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "forwarded"
        );

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;
        response
    }
}

/// 502 with the gateway's fixed JSON error body.
pub fn backend_unavailable() -> Response {
    ApiError::service_unavailable(BACKEND_UNAVAILABLE).into_response()
}

/// Copy `headers` without hop-by-hop fields, including any listed in `Connection`.
fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let connection_listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let hop = HOP_BY_HOP.contains(&name.as_str()) || connection_listed.contains(name);
        if !hop {
            out.append(name.clone(), value.clone());
        }
    }
    out
}
