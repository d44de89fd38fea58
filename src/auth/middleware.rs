// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer authentication middleware for Axum.
//!
//! Layer it over the routes that need an identity:
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/api/v1/pay", post(create_payment))
//!     .route_layer(axum::middleware::from_fn_with_state(codec, require_identity));
//! ```
//!
//! On success the verified [`AuthenticatedUser`] is stored in the request
//! extensions, where the [`Auth`](super::Auth) extractor picks it up.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{token::TokenCodec, AuthError, AuthenticatedUser};

/// Pull the raw token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidToken);
    }

    Ok(token)
}

/// Verify the bearer token in `headers` and build the request identity.
pub fn authenticate_headers(
    headers: &HeaderMap,
    codec: &TokenCodec,
) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(headers)?;
    let claims = codec.verify(token)?;
    Ok(AuthenticatedUser::from_claims(claims)?)
}

/// Reject unauthenticated requests with 401 and attach the identity otherwise.
pub async fn require_identity(
    State(codec): State<TokenCodec>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match authenticate_headers(request.headers(), &codec) {
        Ok(user) => user,
        Err(err) => {
            tracing::debug!(
                method = %request.method(),
                path = %request.uri().path(),
                reason = err.error_code(),
                "bearer authentication rejected"
            );
            return err.into_response();
        }
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}
