// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

/// Liveness probe handler.
///
/// Always returns 200 `OK` while the process is serving. Shared by all
/// three services.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = String, content_type = "text/plain")
    )
)]
pub async fn health() -> &'static str {
    "OK"
}

pub async fn auth_banner() -> &'static str {
    "Paylite Auth Service - See /docs for API documentation"
}

pub async fn payment_banner() -> &'static str {
    "Welcome to Paylite Payment Service - See /docs for API documentation"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_is_plain_ok() {
        assert_eq!(health().await, "OK");
    }
}
