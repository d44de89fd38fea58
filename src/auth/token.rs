// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HMAC bearer token issuance and verification.
//!
//! Tokens are standard three-part JWTs signed with HS256. Verification
//! accepts only the HMAC family (HS256/HS384/HS512) and checks the header
//! algorithm explicitly before any signature work, so an `RS256` or `none`
//! header can never be replayed against the shared secret.
//!
//! Expiry is enforced here rather than by `jsonwebtoken`: a token is valid
//! while `now < exp`, with no leeway.

use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey,
    EncodingKey, Header, Validation,
};

use super::claims::IdentityClaims;

/// Issuer stamped into every token and required on verification.
pub const TOKEN_ISSUER: &str = "paylite";

/// Token lifetime (24 hours).
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signing secret is not configured")]
    MissingSecret,

    #[error("invalid token: {0}")]
    Invalid(&'static str),

    #[error("token has expired")]
    Expired,

    #[error("token claims are missing or malformed")]
    InvalidClaims,

    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Signs and verifies identity tokens with one symmetric secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    configured: bool,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            configured: !secret.is_empty(),
        }
    }

    pub fn issue(&self, email: &str, user_id: i64) -> Result<String, TokenError> {
        self.issue_at(email, user_id, now_unix())
    }

    /// Issue a token as if the current time were `now` (unix seconds).
    pub fn issue_at(&self, email: &str, user_id: i64, now: i64) -> Result<String, TokenError> {
        if !self.configured {
            return Err(TokenError::MissingSecret);
        }

        let claims = IdentityClaims::new(email, user_id, now);
        encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        self.verify_at(token, now_unix())
    }

    /// Verify a token against the clock value `now` (unix seconds).
    pub fn verify_at(&self, token: &str, now: i64) -> Result<IdentityClaims, TokenError> {
        if !self.configured {
            return Err(TokenError::MissingSecret);
        }

        let header = decode_header(token).map_err(|_| TokenError::Invalid("malformed"))?;
        if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
            return Err(TokenError::Invalid("unexpected signing algorithm"));
        }

        let mut validation = Validation::new(header.alg);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();
        validation.set_issuer(&[TOKEN_ISSUER]);

        let claims = decode::<IdentityClaims>(token, &self.decoding, &validation)
            .map_err(map_decode_error)?
            .claims;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"<redacted>")
            .field("configured", &self.configured)
            .finish()
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        JwtErrorKind::InvalidSignature => TokenError::Invalid("signature mismatch"),
        JwtErrorKind::InvalidAlgorithm => TokenError::Invalid("unexpected signing algorithm"),
        JwtErrorKind::InvalidIssuer => TokenError::Invalid("issuer mismatch"),
        JwtErrorKind::ExpiredSignature => TokenError::Expired,
        JwtErrorKind::Json(_) | JwtErrorKind::MissingRequiredClaim(_) => TokenError::InvalidClaims,
        _ => TokenError::Invalid("malformed"),
    }
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use serde_json::json;

    const SECRET: &str = "unit-test-secret";
    const NOW: i64 = 1_750_000_000;

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET)
    }

    fn sign_raw(alg: Algorithm, claims: &serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(alg),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn valid_claims() -> serde_json::Value {
        json!({
            "email": "a@x.com",
            "user_id": 7,
            "iat": NOW,
            "exp": NOW + TOKEN_TTL_SECS,
            "iss": TOKEN_ISSUER,
        })
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let token = codec().issue_at("a@x.com", 7, NOW).unwrap();
        let claims = codec().verify_at(&token, NOW + 1).unwrap();

        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp, NOW + TOKEN_TTL_SECS);
        assert_eq!(claims.iss, TOKEN_ISSUER);
    }

    #[test]
    fn token_is_valid_until_expiry_and_not_at_it() {
        let token = codec().issue_at("a@x.com", 7, NOW).unwrap();
        let exp = NOW + TOKEN_TTL_SECS;

        assert!(codec().verify_at(&token, exp - 1).is_ok());
        assert_eq!(codec().verify_at(&token, exp), Err(TokenError::Expired));
        assert_eq!(codec().verify_at(&token, exp + 3600), Err(TokenError::Expired));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = TokenCodec::new("another-secret").issue_at("a@x.com", 7, NOW).unwrap();
        assert_eq!(
            codec().verify_at(&token, NOW),
            Err(TokenError::Invalid("signature mismatch"))
        );
    }

    #[test]
    fn other_hmac_strengths_are_accepted() {
        let token = sign_raw(Algorithm::HS512, &valid_claims(), SECRET);
        assert!(codec().verify_at(&token, NOW).is_ok());
    }

    #[test]
    fn non_hmac_algorithm_header_is_rejected() {
        let token = sign_raw(Algorithm::HS256, &valid_claims(), SECRET);
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        parts[0] = &forged_header;
        let forged = parts.join(".");

        assert_eq!(
            codec().verify_at(&forged, NOW),
            Err(TokenError::Invalid("unexpected signing algorithm"))
        );
    }

    #[test]
    fn none_algorithm_is_rejected() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(valid_claims().to_string());
        let token = format!("{header}.{payload}.");

        assert!(matches!(
            codec().verify_at(&token, NOW),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            codec().verify_at("not-a-token", NOW),
            Err(TokenError::Invalid("malformed"))
        );
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let mut claims = valid_claims();
        claims["iss"] = json!("someone-else");
        let token = sign_raw(Algorithm::HS256, &claims, SECRET);

        assert_eq!(
            codec().verify_at(&token, NOW),
            Err(TokenError::Invalid("issuer mismatch"))
        );
    }

    #[test]
    fn string_user_id_is_invalid_claims() {
        let mut claims = valid_claims();
        claims["user_id"] = json!("7");
        let token = sign_raw(Algorithm::HS256, &claims, SECRET);

        assert_eq!(codec().verify_at(&token, NOW), Err(TokenError::InvalidClaims));
    }

    #[test]
    fn missing_email_is_invalid_claims() {
        let mut claims = valid_claims();
        claims.as_object_mut().unwrap().remove("email");
        let token = sign_raw(Algorithm::HS256, &claims, SECRET);

        assert_eq!(codec().verify_at(&token, NOW), Err(TokenError::InvalidClaims));
    }

    #[test]
    fn unknown_claim_is_rejected() {
        let mut claims = valid_claims();
        claims["role"] = json!("admin");
        let token = sign_raw(Algorithm::HS256, &claims, SECRET);

        assert_eq!(codec().verify_at(&token, NOW), Err(TokenError::InvalidClaims));
    }

    #[test]
    fn empty_secret_cannot_issue_or_verify() {
        let empty = TokenCodec::new("");
        assert_eq!(empty.issue("a@x.com", 1), Err(TokenError::MissingSecret));

        let token = codec().issue("a@x.com", 1).unwrap();
        assert_eq!(empty.verify(&token), Err(TokenError::MissingSecret));
    }

    #[test]
    fn debug_output_hides_secret() {
        let rendered = format!("{:?}", codec());
        assert!(!rendered.contains(SECRET));
    }
}
