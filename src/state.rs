// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-service application state.
//!
//! Everything a handler needs is injected here at startup. There is no
//! process-wide mutable state; tests build these with fake collaborators.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    auth::TokenCodec,
    gateway::{cors::CorsPolicy, proxy::ReverseProxy},
    providers::PaymentProcessor,
    storage::{CredentialStore, PaymentStore},
};

#[derive(Clone, FromRef)]
pub struct AuthState {
    pub codec: TokenCodec,
    pub credentials: Arc<dyn CredentialStore>,
}

impl AuthState {
    pub fn new(codec: TokenCodec, credentials: Arc<dyn CredentialStore>) -> Self {
        Self { codec, credentials }
    }
}

#[derive(Clone, FromRef)]
pub struct PaymentState {
    pub codec: TokenCodec,
    pub payments: Arc<dyn PaymentStore>,
    pub processor: Arc<dyn PaymentProcessor>,
}

impl PaymentState {
    pub fn new(
        codec: TokenCodec,
        payments: Arc<dyn PaymentStore>,
        processor: Arc<dyn PaymentProcessor>,
    ) -> Self {
        Self {
            codec,
            payments,
            processor,
        }
    }
}

#[derive(Clone, FromRef)]
pub struct GatewayState {
    pub proxy: ReverseProxy,
    pub cors: CorsPolicy,
}
