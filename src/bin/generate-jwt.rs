// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Print a signed identity token for manual testing.
//!
//! ```text
//! generate-jwt [email] [user_id]
//! ```
//!
//! `JWT_SECRET` is required; the development fallback is never used here.

use std::process::ExitCode;

use paylite::{
    auth::TokenCodec,
    config::{load_dotenv, JWT_SECRET_ENV},
    telemetry::init_tracing,
};

const DEFAULT_EMAIL: &str = "test@example.com";
const DEFAULT_USER_ID: i64 = 1;

fn main() -> ExitCode {
    let dotenv = load_dotenv();
    init_tracing();
    dotenv.log();

    let mut args = std::env::args().skip(1);
    let email = args.next().unwrap_or_else(|| DEFAULT_EMAIL.to_string());
    let user_id = match args.next().map(|raw| raw.parse::<i64>()) {
        None => DEFAULT_USER_ID,
        Some(Ok(id)) => id,
        Some(Err(e)) => {
            tracing::error!(error = %e, "user_id must be an integer");
            return ExitCode::FAILURE;
        }
    };

    let secret = std::env::var(JWT_SECRET_ENV).unwrap_or_default();
    if secret.trim().is_empty() {
        tracing::error!("{JWT_SECRET_ENV} is not set in the environment");
        return ExitCode::FAILURE;
    }

    match TokenCodec::new(secret.trim()).issue(&email, user_id) {
        Ok(token) => {
            println!("{token}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "token signing failed");
            ExitCode::FAILURE
        }
    }
}
