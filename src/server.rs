// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP serving and process lifecycle shared by all services.
//!
//! ## Lifecycle
//!
//! 1. Bind the listener and serve with peer addresses attached
//!    (`ConnectInfo<SocketAddr>`)
//! 2. SIGINT or SIGTERM cancels the shutdown token
//! 3. The listener stops accepting; in-flight requests get
//!    [`SHUTDOWN_GRACE`] to finish before the server is torn down
//!
//! Request time limits belong to each router: backends answer 408 after
//! [`REQUEST_TIMEOUT`], the gateway reports slow backends itself.

use std::{future::IntoFuture, net::SocketAddr, time::Duration};

use axum::{body::Body, http::Request, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, info_span, warn};

use crate::{config::ConfigError, storage::StorageError};

/// Upper bound for handling one backend request, body reads included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// How long in-flight requests may run after a termination signal.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage initialisation failed: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Request id and tracing span applied to every service.
pub fn with_http_layers(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    info_span!(
                        "http",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id,
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id()),
    )
}

/// Bind `addr` and serve until `shutdown` is cancelled.
pub async fn serve(
    service: &'static str,
    router: Router,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> Result<(), StartupError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;
    serve_listener(service, router, listener, shutdown).await
}

/// Serve on an already bound listener until `shutdown` is cancelled.
pub async fn serve_listener(
    service: &'static str,
    router: Router,
    listener: TcpListener,
    shutdown: CancellationToken,
) -> Result<(), StartupError> {
    if let Ok(local) = listener.local_addr() {
        info!(service, addr = %local, "listening (docs at /docs where available)");
    }

    let app = with_http_layers(router).into_make_service_with_connect_info::<SocketAddr>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();
    tokio::pin!(server);

    let drain_deadline = async {
        shutdown.cancelled().await;
        tokio::time::sleep(SHUTDOWN_GRACE).await;
    };

    tokio::select! {
        result = &mut server => {
            result.map_err(StartupError::Serve)?;
            info!(service, "server stopped");
        }
        _ = drain_deadline => {
            warn!(service, grace_secs = SHUTDOWN_GRACE.as_secs(), "in-flight requests did not finish in time; forcing shutdown");
        }
    }

    Ok(())
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM.
pub fn watch_termination(service: &'static str, shutdown: CancellationToken) {
    tokio::spawn(async move {
        termination_signal().await;
        info!(service, "termination signal received, draining");
        shutdown.cancel();
    });
}

#[cfg(unix)]
async fn termination_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = sigterm.recv() => {}
                _ = tokio::signal::ctrl_c() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "failed to register SIGTERM handler; only Ctrl-C stops the server");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn termination_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get};
    use tower::ServiceExt;

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let app = with_http_layers(Router::new().route("/", get(|| async { "hi" })));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn cancelled_token_stops_an_idle_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let token = CancellationToken::new();
        let handle = tokio::spawn(serve_listener(
            "test",
            Router::new().route("/", get(|| async { "hi" })),
            listener,
            token.clone(),
        ));

        token.cancel();
        let result = tokio::time::timeout(Duration::from_secs(3), handle)
            .await
            .expect("server did not stop")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let result = serve("test", Router::new(), addr, CancellationToken::new()).await;
        assert!(matches!(result, Err(StartupError::Bind { .. })));
    }
}
