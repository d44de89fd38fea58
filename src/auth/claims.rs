// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::token::{TokenError, TOKEN_ISSUER, TOKEN_TTL_SECS};

/// Claims carried inside an identity token.
///
/// Decoded once per verification. Unknown fields are rejected so a token
/// minted by another system cannot smuggle extra authority in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityClaims {
    pub email: String,
    pub user_id: i64,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

impl IdentityClaims {
    pub fn new(email: impl Into<String>, user_id: i64, issued_at: i64) -> Self {
        Self {
            email: email.into(),
            user_id,
            exp: issued_at + TOKEN_TTL_SECS,
            iat: issued_at,
            iss: TOKEN_ISSUER.to_string(),
        }
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

/// Identity attached to a request after successful token verification.
///
/// Lives only for the duration of one request and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Numeric user identifier
    pub user_id: i64,
    /// Email the token was issued to
    pub email: String,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: IdentityClaims) -> Result<Self, TokenError> {
        let email = claims.email.trim();
        if email.is_empty() {
            return Err(TokenError::InvalidClaims);
        }

        Ok(Self {
            user_id: claims.user_id,
            email: email.to_string(),
        })
    }
}
