//! Access token inspection.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use std::collections::HashSet;

/// Placeholder token issued by development backends
pub const DEVELOPMENT_TOKEN: &str = "mock-development-token";

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: Option<i64>,
}

/// Expiry encoded in a JWT access token.
///
/// The signature is not checked; the client cannot verify it and only needs the
/// `exp` claim to avoid sending a token the server will reject. Tokens that are
/// not JWTs are opaque and yield `None`.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    let data = decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    DateTime::from_timestamp(data.claims.exp?, 0)
}

/// Whether the token's `exp` is in the past. Opaque tokens never expire.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now())
}

pub fn is_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    expires_at(token).is_some_and(|exp| now >= exp)
}

/// Whether the token is a development placeholder
pub fn is_placeholder(token: &str, prefix: &str) -> bool {
    token == DEVELOPMENT_TOKEN || (!prefix.is_empty() && token.starts_with(prefix))
}
