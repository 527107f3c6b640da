//! Login strategy selection.
//!
//! A login attempt is routed to exactly one strategy. `Remote` is the normal
//! path through the authentication API. `ElevatedBypass` is a network-free
//! administrative login for development setups; it only exists when a
//! [`BypassIdentity`] is configured and is disabled by default. `Google`
//! exchanges a Google ID token through the API.

use super::models::{Credentials, GoogleSignIn, Role, UserProfile};
use chrono::Utc;
use std::fmt;
use subtle::ConstantTimeEq;

/// Fixed identity accepted by the bypass strategy
#[derive(Clone, PartialEq, Eq)]
pub struct BypassIdentity {
    pub email: String,
    pub password: String,
}

impl BypassIdentity {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Identity used by local development builds of the platform
    pub fn development() -> Self {
        Self::new("admin@ecomflex.com", "Admin@123")
    }

    /// Whether `credentials` name this identity.
    ///
    /// Emails compare case-insensitively; the password compare is constant time.
    pub fn matches(&self, credentials: &Credentials) -> bool {
        let email_matches = self
            .email
            .trim()
            .eq_ignore_ascii_case(credentials.email.trim());
        let password_matches: bool = self
            .password
            .as_bytes()
            .ct_eq(credentials.password.as_bytes())
            .into();
        email_matches & password_matches
    }

    /// Synthetic admin profile committed on a bypass login
    pub fn profile(&self) -> UserProfile {
        let now = Utc::now().to_rfc3339();
        UserProfile {
            id: "superadmin-id".to_string(),
            display_name: "System Administrator".to_string(),
            email: self.email.trim().to_string(),
            phone_number: String::new(),
            role: Role::Admin,
            avatar_url: None,
            created_at: Some(now.clone()),
            updated_at: Some(now.clone()),
            last_login_at: Some(now),
        }
    }
}

impl fmt::Debug for BypassIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BypassIdentity")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authentication strategy for one login attempt, carrying what it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStrategy {
    /// Email and password against the remote API
    Remote(Credentials),
    /// Commit an admin session locally without contacting the API
    ElevatedBypass(BypassIdentity),
    /// Exchange a Google ID token for a session
    Google(GoogleSignIn),
}

impl LoginStrategy {
    /// Pick the strategy for `credentials` given the configured bypass identity
    pub fn select(bypass: Option<&BypassIdentity>, credentials: Credentials) -> Self {
        match bypass {
            Some(identity) if identity.matches(&credentials) => {
                LoginStrategy::ElevatedBypass(identity.clone())
            }
            _ => LoginStrategy::Remote(credentials),
        }
    }

    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            LoginStrategy::Remote(_) => "password",
            LoginStrategy::ElevatedBypass(_) => "elevated-bypass",
            LoginStrategy::Google(_) => "google",
        }
    }
}
