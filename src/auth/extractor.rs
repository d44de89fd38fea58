// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use super::{middleware::authenticate_headers, token::TokenCodec, AuthError, AuthenticatedUser};

/// Authenticated caller of the current request.
///
/// Reuses the identity stored by [`require_identity`](super::middleware::require_identity)
/// when the route is layered, otherwise verifies the bearer token itself.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    TokenCodec: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let codec = TokenCodec::from_ref(state);
        let user = authenticate_headers(&parts.headers, &codec)?;
        Ok(Auth(user))
    }
}
