// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::token::TokenError;
use crate::error::ApiError;

/// Bearer authentication failures.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Header present but not `Bearer <token>`
    InvalidAuthHeader,
    /// Bad signature, unexpected algorithm, foreign issuer or unparseable token
    InvalidToken,
    /// Token is past its expiry
    TokenExpired,
    /// Claims missing, mistyped or empty
    InvalidClaims,
    /// Signing secret missing or similar local failure
    Internal(String),
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::InvalidToken => "invalid_token",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidClaims => "invalid_claims",
            AuthError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Authorization header must start with 'Bearer '")
            }
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::InvalidClaims => write!(f, "Invalid token claims"),
            AuthError::Internal(_) => write!(f, "Authentication is unavailable"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::InvalidClaims => AuthError::InvalidClaims,
            TokenError::Invalid(_) => AuthError::InvalidToken,
            TokenError::MissingSecret | TokenError::Encoding(_) => {
                AuthError::Internal(err.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = err.status_code();
        match err {
            AuthError::Internal(_) => ApiError::internal(err.to_string()),
            _ => ApiError::unauthorized(err.to_string()),
        }
        .with_status(status)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(detail) = &self {
            tracing::error!(error = %detail, "bearer authentication failed internally");
        }
        ApiError::from(self).into_response()
    }
}
