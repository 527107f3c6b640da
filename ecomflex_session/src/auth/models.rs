//! Session data models.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// User ID type
pub type UserId = String;

/// Platform role, determines route access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Influencer,
    #[default]
    Public,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Influencer => "influencer",
            Role::Public => "public",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "influencer" => Ok(Role::Influencer),
            "public" => Ok(Role::Public),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

// Unknown role strings from the backend degrade to `public`.
impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_default())
    }
}

/// User profile as returned by the authentication API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default, alias = "full_name", alias = "fullName")]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "phone")]
    pub phone_number: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, alias = "profile_picture", alias = "profilePicture")]
    pub avatar_url: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: Option<String>,
    #[serde(default, alias = "last_login", alias = "lastLogin")]
    pub last_login_at: Option<String>,
}

/// Login credentials. Never persisted.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    #[serde(rename = "captcha_token", skip_serializing_if = "Option::is_none")]
    pub challenge_token: Option<String>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            challenge_token: None,
        }
    }

    pub fn with_challenge(mut self, token: impl Into<String>) -> Self {
        self.challenge_token = Some(token.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("challenge_token", &self.challenge_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Google sign-in request. The ID token comes from Google's client library;
/// `role` is the account type to create when the user is new.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct GoogleSignIn {
    #[serde(rename = "auth_token")]
    pub id_token: String,
    pub role: Role,
    #[serde(rename = "captcha_token", skip_serializing_if = "Option::is_none")]
    pub challenge_token: Option<String>,
}

impl GoogleSignIn {
    pub fn new(id_token: impl Into<String>, role: Role) -> Self {
        Self {
            id_token: id_token.into(),
            role,
            challenge_token: None,
        }
    }

    pub fn with_challenge(mut self, token: impl Into<String>) -> Self {
        self.challenge_token = Some(token.into());
        self
    }
}

impl fmt::Debug for GoogleSignIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleSignIn")
            .field("id_token", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Access/refresh token pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Normalized result of any token-granting response
#[derive(Debug, Clone, PartialEq)]
pub struct AuthGrant {
    pub tokens: TokenPair,
    pub user: Option<UserProfile>,
}

/// Result of a registration call. Tokens are only present when the backend
/// logs the new account in immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub grant: Option<AuthGrant>,
    pub user: Option<UserProfile>,
}

/// Self-service registration for a public user
#[derive(Debug, Clone)]
pub struct PublicRegistration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub agree_to_terms: bool,
    /// Bot-challenge proof forwarded as `captcha_token`
    pub challenge_token: Option<String>,
}

/// Registration request for an influencer account
#[derive(Debug, Clone)]
pub struct InfluencerRegistration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    /// Platform name to profile URL; empty URLs are dropped
    pub social_media: Vec<(String, String)>,
    pub followers: u64,
    pub niche: String,
    pub agree_to_terms: bool,
    pub referral_code: Option<String>,
    pub challenge_token: Option<String>,
}

/// Wire body for `auth/register`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha_token: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub social_links: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follower_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl From<&PublicRegistration> for RegisterRequest {
    fn from(reg: &PublicRegistration) -> Self {
        Self {
            email: reg.email.trim().to_string(),
            password: reg.password.clone(),
            full_name: reg.full_name.trim().to_string(),
            phone: reg.phone.trim().to_string(),
            role: Role::Public,
            captcha_token: non_empty(reg.challenge_token.as_deref()),
            social_links: Vec::new(),
            follower_count: None,
            referral_code: None,
        }
    }
}

impl From<&InfluencerRegistration> for RegisterRequest {
    fn from(reg: &InfluencerRegistration) -> Self {
        let social_links = reg
            .social_media
            .iter()
            .filter(|(_, url)| !url.trim().is_empty())
            .map(|(platform, url)| format!("{}:{}", platform, url.trim()))
            .collect();

        Self {
            email: reg.email.trim().to_string(),
            password: reg.password.clone(),
            full_name: reg.full_name.trim().to_string(),
            phone: reg.phone.trim().to_string(),
            role: Role::Influencer,
            captcha_token: non_empty(reg.challenge_token.as_deref()),
            social_links,
            follower_count: Some(reg.followers),
            referral_code: non_empty(reg.referral_code.as_deref()),
        }
    }
}

/// How the current session was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    #[default]
    Normal,
    /// Network-free administrative session established by a configured
    /// bypass identity. Carries no token pair.
    ElevatedBypass,
}

/// Lifecycle phase of the session manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPhase {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated,
    Refreshing,
}

/// In-memory session held by the manager
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
    /// Role as persisted; survives a reload even when the profile does not.
    pub role: Option<Role>,
    pub mode: SessionMode,
}

impl Session {
    pub fn is_bypass(&self) -> bool {
        self.mode == SessionMode::ElevatedBypass
    }

    pub fn effective_role(&self) -> Option<Role> {
        if self.is_bypass() {
            return Some(Role::Admin);
        }
        self.user.as_ref().map(|u| u.role).or(self.role)
    }
}

/// Read-only view of the session handed to the route guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub role: Option<Role>,
    pub mode: SessionMode,
}

/// Outcome of a successful `refresh` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    /// A new access token was obtained
    Refreshed,
    /// No network call was needed (bypass or placeholder session)
    Skipped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_case_insensitive() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" influencer ".parse::<Role>(), Ok(Role::Influencer));
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_profile_accepts_camel_case_aliases() {
        let json = serde_json::json!({
            "id": "u-1",
            "fullName": "Jane Doe",
            "email": "jane@example.com",
            "phone": "+15550001111",
            "role": "INFLUENCER",
            "profilePicture": "https://cdn.example.com/jane.png",
            "lastLogin": "2024-01-01T00:00:00Z"
        });

        let profile: UserProfile = serde_json::from_value(json).unwrap();
        assert_eq!(profile.display_name, "Jane Doe");
        assert_eq!(profile.phone_number, "+15550001111");
        assert_eq!(profile.role, Role::Influencer);
        assert_eq!(profile.avatar_url.as_deref(), Some("https://cdn.example.com/jane.png"));
        assert_eq!(profile.last_login_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_unknown_role_defaults_to_public() {
        let profile: UserProfile =
            serde_json::from_value(serde_json::json!({"id": "u-2", "role": "moderator"})).unwrap();
        assert_eq!(profile.role, Role::Public);
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("a@b.com", "hunter2").with_challenge("proof");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("proof"));
    }

    #[test]
    fn test_google_sign_in_wire_names() {
        let body =
            serde_json::to_value(GoogleSignIn::new("google-id-token", Role::Influencer)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"auth_token": "google-id-token", "role": "influencer"})
        );
        assert!(!format!("{:?}", GoogleSignIn::new("google-id-token", Role::Public)).contains("google-id-token"));
    }

    #[test]
    fn test_influencer_request_drops_empty_links() {
        let reg = InfluencerRegistration {
            full_name: "Ivy".to_string(),
            email: "ivy@example.com".to_string(),
            password: "Password1".to_string(),
            phone: "+15550002222".to_string(),
            social_media: vec![
                ("instagram".to_string(), "https://instagram.com/ivy".to_string()),
                ("tiktok".to_string(), "  ".to_string()),
            ],
            followers: 12_500,
            niche: "fitness".to_string(),
            agree_to_terms: true,
            referral_code: Some(String::new()),
            challenge_token: Some("challenge-ok".to_string()),
        };

        let request = RegisterRequest::from(&reg);
        assert_eq!(request.captcha_token.as_deref(), Some("challenge-ok"));
        assert_eq!(request.role, Role::Influencer);
        assert_eq!(request.social_links, vec!["instagram:https://instagram.com/ivy"]);
        assert_eq!(request.follower_count, Some(12_500));
        assert!(request.referral_code.is_none());
    }

    #[test]
    fn test_public_request_forwards_challenge() {
        let mut reg = PublicRegistration {
            full_name: " Pat ".to_string(),
            email: "pat@example.com".to_string(),
            password: "Password1".to_string(),
            phone: "+15550003333".to_string(),
            agree_to_terms: true,
            challenge_token: Some(" proof-1 ".to_string()),
        };

        let body = serde_json::to_value(RegisterRequest::from(&reg)).unwrap();
        assert_eq!(body["captcha_token"], "proof-1");
        assert_eq!(body["full_name"], "Pat");

        reg.challenge_token = Some("   ".to_string());
        let body = serde_json::to_value(RegisterRequest::from(&reg)).unwrap();
        assert!(body.get("captcha_token").is_none());
    }

    #[test]
    fn test_bypass_session_is_admin() {
        let session = Session {
            mode: SessionMode::ElevatedBypass,
            ..Default::default()
        };
        assert_eq!(session.effective_role(), Some(Role::Admin));
    }
}
