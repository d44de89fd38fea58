// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Paylite - API gateway, authentication service and payment service
//!
//! Three independently deployable HTTP services built from one crate. The
//! gateway reverse-proxies `/api/v1/auth/*` and `/api/v1/pay*` to the
//! backends; the backends share a stateless HMAC bearer-token protocol.
//!
//! ## Modules
//!
//! - `api` - Backend HTTP handlers and routers (Axum)
//! - `auth` - Token codec, claims and bearer middleware
//! - `gateway` - Reverse proxy, route table and gateway CORS
//! - `storage` - Credential and payment stores (redb)
//! - `providers` - Payment processor client (Razorpay)
//! - `server` - Shared HTTP layers and graceful shutdown

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod password;
pub mod providers;
pub mod server;
pub mod state;
pub mod storage;
pub mod telemetry;
