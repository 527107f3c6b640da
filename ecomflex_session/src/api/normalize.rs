//! Response body normalization.
//!
//! The backend has shipped several envelope shapes for token-bearing
//! responses. All of them are reduced here, once, to [`AuthGrant`]:
//!
//! - flat: `{ "access": .., "refresh": .., "user": {..} }`
//! - nested under `token`: `{ "token": { "access_token": .. }, "user": {..} }`
//! - nested under `data.token`: `{ "data": { "token": {..}, "user": {..} } }`
//!
//! Token fields may be spelled `access`/`access_token` and
//! `refresh`/`refresh_token`.

use crate::auth::models::{AuthGrant, TokenPair, UserProfile};
use log::warn;
use serde_json::Value;

/// Tokens returned by the refresh endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    pub access_token: String,
    /// Present when the backend rotates refresh tokens
    pub refresh_token: Option<String>,
}

/// Candidate (token container, user container) pairs, in precedence order
fn token_candidates(body: &Value) -> [(Option<&Value>, Option<&Value>); 3] {
    let data = body.get("data");
    [
        (Some(body), body.get("user")),
        (body.get("token"), body.get("user")),
        (
            data.and_then(|d| d.get("token")),
            data.and_then(|d| d.get("user")),
        ),
    ]
}

fn non_empty_str<'a>(container: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| container.get(*k))
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
}

fn access_token(container: &Value) -> Option<&str> {
    non_empty_str(container, &["access", "access_token"])
}

fn refresh_token(container: &Value) -> Option<&str> {
    non_empty_str(container, &["refresh", "refresh_token"])
}

fn parse_user(user: Option<&Value>) -> Option<UserProfile> {
    let user = user.filter(|u| u.is_object())?;
    match serde_json::from_value(user.clone()) {
        Ok(profile) => Some(profile),
        Err(e) => {
            warn!("Ignoring unparseable user object in auth response: {}", e);
            None
        }
    }
}

/// Extract a complete token grant. Returns `None` unless both tokens are present.
pub fn extract_grant(body: &Value) -> Option<AuthGrant> {
    token_candidates(body)
        .into_iter()
        .find_map(|(container, user)| {
            let container = container.filter(|c| c.is_object())?;
            let tokens = TokenPair {
                access_token: access_token(container)?.to_string(),
                refresh_token: refresh_token(container)?.to_string(),
            };
            Some(AuthGrant {
                tokens,
                user: parse_user(user),
            })
        })
}

/// Extract the new access token (and rotated refresh token) from a refresh response
pub fn extract_refreshed(body: &Value) -> Option<RefreshedTokens> {
    token_candidates(body)
        .into_iter()
        .find_map(|(container, _)| {
            let container = container.filter(|c| c.is_object())?;
            Some(RefreshedTokens {
                access_token: access_token(container)?.to_string(),
                refresh_token: refresh_token(container).map(str::to_string),
            })
        })
}

/// Extract a user profile from a profile or registration response
pub fn extract_user(body: &Value) -> Option<UserProfile> {
    if body.get("id").is_some() {
        return parse_user(Some(body));
    }
    let data = body.get("data");
    parse_user(body.get("user"))
        .or_else(|| parse_user(data.and_then(|d| d.get("user"))))
        .or_else(|| parse_user(data.filter(|d| d.get("id").is_some())))
}

/// Whether a 2xx body explicitly reports failure (`success: false` or `status: "error"`)
pub fn reports_failure(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool) == Some(false)
        || body.get("status").and_then(Value::as_str) == Some("error")
}

/// Human-readable message from an error body
pub fn error_message(body: &Value) -> Option<String> {
    ["message", "detail", "error"]
        .iter()
        .filter_map(|k| body.get(*k))
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
