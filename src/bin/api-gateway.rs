// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! API gateway: the public entry point proxying to the backend services.

use std::process::ExitCode;

use paylite::{
    config::{load_dotenv, GatewayConfig},
    gateway::{gateway_router, gateway_state},
    server::{serve, watch_termination, StartupError},
    telemetry::init_tracing,
};
use tokio_util::sync::CancellationToken;

const SERVICE: &str = "api-gateway";

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = load_dotenv();
    init_tracing();
    dotenv.log();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(service = SERVICE, error = %e, "startup failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = GatewayConfig::from_env()?;
    let state = gateway_state(&config).map_err(|e| StartupError::HttpClient(e.to_string()))?;

    for rule in state.proxy.rules() {
        tracing::info!(
            backend = rule.name,
            prefix = %rule.match_prefix,
            target = %rule.backend,
            "route registered"
        );
    }

    let shutdown = CancellationToken::new();
    watch_termination(SERVICE, shutdown.clone());
    serve(SERVICE, gateway_router(state), config.bind_addr, shutdown).await
}
