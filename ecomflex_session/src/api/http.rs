//! HTTP implementation of [`AuthApi`].

use super::normalize::{self, RefreshedTokens};
use super::{ApiError, ApiResult, AuthApi};
use crate::auth::models::{
    AuthGrant, Credentials, GoogleSignIn, RegisterRequest, Registration, UserProfile,
};
use crate::config::SessionConfig;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;

/// Authentication API client over `reqwest`
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAuthApi {
    /// Create a client for `base_url` with a fixed per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &SessionConfig) -> ApiResult<Self> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        bearer: Option<&str>,
    ) -> ApiResult<Value> {
        send_json(&self.client, method, &self.url(path), body, bearer).await
    }

    async fn post(&self, path: &str, body: &Value, bearer: Option<&str>) -> ApiResult<Value> {
        self.send(Method::POST, path, Some(body), bearer).await
    }
}

/// Join a base URL without trailing slash and a relative path
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Send a request and return the decoded JSON body of a 2xx response.
///
/// Empty bodies decode to `Value::Null`. Non-2xx statuses become
/// [`ApiError::from_status`] with the server's message, if any.
pub(crate) async fn send_json<B: Serialize + ?Sized>(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<&B>,
    bearer: Option<&str>,
) -> ApiResult<Value> {
    debug!("{} {}", method, url);

    let mut request = client.request(method, url);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }
    if let Some(body) = body {
        request = request.json(body);
    }

    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    let body: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) if status.is_success() => {
                return Err(ApiError::MalformedResponse(format!(
                    "{} returned non-JSON body: {}",
                    url, e
                )));
            }
            Err(_) => Value::Null,
        }
    };

    if !status.is_success() {
        let message = normalize::error_message(&body);
        debug!("{} failed with {}: {:?}", url, status, message);
        return Err(ApiError::from_status(status.as_u16(), message));
    }

    Ok(body)
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: &Credentials) -> ApiResult<AuthGrant> {
        let body = self
            .send(Method::POST, "auth/login", Some(credentials), None)
            .await?;

        normalize::extract_grant(&body).ok_or_else(|| {
            ApiError::MalformedResponse("login response carried no token pair".to_string())
        })
    }

    async fn google_login(&self, sign_in: &GoogleSignIn) -> ApiResult<AuthGrant> {
        let body = self
            .send(Method::POST, "auth/google/login", Some(sign_in), None)
            .await?;

        normalize::extract_grant(&body).ok_or_else(|| {
            ApiError::MalformedResponse("google login response carried no token pair".to_string())
        })
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<Registration> {
        let body = self
            .send(Method::POST, "auth/register", Some(request), None)
            .await?;

        if normalize::reports_failure(&body) {
            return Err(ApiError::Status {
                status: StatusCode::OK.as_u16(),
                message: normalize::error_message(&body),
            });
        }

        Ok(Registration {
            grant: normalize::extract_grant(&body),
            user: normalize::extract_user(&body),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> ApiResult<RefreshedTokens> {
        let body = self
            .post("auth/refresh", &json!({ "refresh_token": refresh_token }), None)
            .await?;

        normalize::extract_refreshed(&body).ok_or_else(|| {
            ApiError::MalformedResponse("refresh response carried no access token".to_string())
        })
    }

    async fn logout(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> ApiResult<()> {
        self.post(
            "auth/logout",
            &json!({ "refresh_token": refresh_token }),
            access_token,
        )
        .await
        .map(|_| ())
    }

    async fn request_password_reset(&self, email: &str) -> ApiResult<()> {
        self.post("auth/password-reset", &json!({ "email": email }), None)
            .await
            .map(|_| ())
    }

    async fn confirm_password_reset(&self, token: &str, new_password: &str) -> ApiResult<()> {
        self.post(
            "auth/password-reset/confirm",
            &json!({
                "token": token,
                "new_password": new_password,
                "confirm_password": new_password,
            }),
            None,
        )
        .await
        .map(|_| ())
    }

    async fn fetch_profile(&self, access_token: &str) -> ApiResult<UserProfile> {
        let body = self
            .send::<Value>(Method::GET, "users/me", None, Some(access_token))
            .await?;

        normalize::extract_user(&body).ok_or_else(|| {
            warn!("Profile response did not contain a user");
            ApiError::MalformedResponse("profile response carried no user".to_string())
        })
    }
}
