//! Remote authentication API.
//!
//! [`AuthApi`] is the seam between the session manager and the backend.
//! [`HttpAuthApi`] talks JSON over HTTP; every response passes through
//! [`normalize`] before it reaches the manager, so callers only ever see
//! [`AuthGrant`](crate::auth::AuthGrant) and friends.

pub mod errors;
pub mod http;
pub mod normalize;

pub use errors::{ApiError, ApiResult};
pub use http::HttpAuthApi;
pub use normalize::RefreshedTokens;

use crate::auth::models::{
    AuthGrant, Credentials, GoogleSignIn, RegisterRequest, Registration, UserProfile,
};
use async_trait::async_trait;

/// Authentication endpoints used by the session manager
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a token grant
    async fn login(&self, credentials: &Credentials) -> ApiResult<AuthGrant>;

    /// Exchange a Google ID token for a token grant, creating the account if needed
    async fn google_login(&self, sign_in: &GoogleSignIn) -> ApiResult<AuthGrant>;

    /// Create a public or influencer account
    async fn register(&self, request: &RegisterRequest) -> ApiResult<Registration>;

    /// Exchange a refresh token for a new access token
    async fn refresh(&self, refresh_token: &str) -> ApiResult<RefreshedTokens>;

    /// Notify the backend that the session ended
    async fn logout(&self, access_token: Option<&str>, refresh_token: Option<&str>)
    -> ApiResult<()>;

    /// Ask the backend to send a password reset code
    async fn request_password_reset(&self, email: &str) -> ApiResult<()>;

    /// Set a new password using a reset token
    async fn confirm_password_reset(&self, token: &str, new_password: &str) -> ApiResult<()>;

    /// Fetch the profile of the token's owner
    async fn fetch_profile(&self, access_token: &str) -> ApiResult<UserProfile>;
}
