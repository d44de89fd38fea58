// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless bearer-token authentication shared by every backend service.
//!
//! ## Auth Flow
//!
//! 1. The authentication service verifies credentials and issues a token
//!    via [`TokenCodec::issue`]
//! 2. Clients send `Authorization: Bearer <token>`
//! 3. Protected routes run [`middleware::require_identity`], which:
//!    - Checks the header algorithm against the HMAC family
//!    - Verifies signature, issuer and expiry
//!    - Decodes the typed claim set and stores the caller identity in the
//!      request extensions
//!
//! ## Security
//!
//! - One shared symmetric secret, loaded once at startup
//! - No clock skew tolerance
//! - Failure responses distinguish invalid, expired and malformed-claims
//!   tokens, nothing finer

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod token;

pub use claims::{AuthenticatedUser, IdentityClaims};
pub use error::AuthError;
pub use extractor::Auth;
pub use token::{TokenCodec, TokenError};
