// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication service: registration, login and token identity lookup.

use std::{process::ExitCode, sync::Arc};

use paylite::{
    api::auth_router,
    auth::TokenCodec,
    config::{load_dotenv, AuthServiceConfig},
    server::{serve, watch_termination, StartupError},
    state::AuthState,
    storage::{open_database, RedbCredentialStore},
    telemetry::init_tracing,
};
use tokio_util::sync::CancellationToken;

const SERVICE: &str = "auth-service";

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
    let config = AuthServiceConfig::from_env()?;
    config.jwt_secret.warn_if_dev_fallback(SERVICE);

    let db = open_database(&config.database_path)?;
    let credentials = RedbCredentialStore::open(db)?;
    tracing::info!(path = %config.database_path.display(), "credential store ready");

    let state = AuthState::new(
        TokenCodec::new(config.jwt_secret.expose()),
        Arc::new(credentials),
    );
    let router = auth_router(state, &config.allowed_origins);

    let shutdown = CancellationToken::new();
    watch_termination(SERVICE, shutdown.clone());
    serve(SERVICE, router, config.bind_addr, shutdown).await
}
