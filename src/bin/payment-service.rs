// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Payment service: creates processor orders and records payments.

use std::{process::ExitCode, sync::Arc};

use paylite::{
    api::payment_router,
    auth::TokenCodec,
    config::{load_dotenv, PaymentServiceConfig},
    providers::RazorpayClient,
    server::{serve, watch_termination, StartupError},
    state::PaymentState,
    storage::{open_database, RedbPaymentStore},
    telemetry::init_tracing,
};
use tokio_util::sync::CancellationToken;

const SERVICE: &str = "payment-service";

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
    let config = PaymentServiceConfig::from_env()?;
    config.jwt_secret.warn_if_dev_fallback(SERVICE);

    let db = open_database(&config.database_path)?;
    let payments = RedbPaymentStore::open(db)?;
    tracing::info!(path = %config.database_path.display(), "payment store ready");

    let processor = RazorpayClient::new(config.razorpay.clone())
        .map_err(|e| StartupError::HttpClient(e.to_string()))?;
    tracing::info!(client = ?processor, "payment processor configured");

    let state = PaymentState::new(
        TokenCodec::new(config.jwt_secret.expose()),
        Arc::new(payments),
        Arc::new(processor),
    );
    let router = payment_router(state, &config.allowed_origins);

    let shutdown = CancellationToken::new();
    watch_termination(SERVICE, shutdown.clone());
    serve(SERVICE, router, config.bind_addr, shutdown).await
}
