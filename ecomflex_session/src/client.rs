//! Authorized JSON requests against the Ecomflex API.
//!
//! [`AuthorizedClient`] attaches the session's access token to every request.
//! When the backend answers 401 it asks the [`SessionManager`] for a refresh
//! and retries the request once with the new token. Concurrent requests that
//! hit 401 together share a single refresh, and a 401 for a token that has
//! already been replaced retries without refreshing again.

use crate::api::http::{join_url, send_json};
use crate::api::{ApiError, ApiResult};
use crate::auth::{RefreshStatus, SessionError, SessionManager, SessionResult};
use log::{debug, info};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Request pipeline bound to a session
#[derive(Debug, Clone)]
pub struct AuthorizedClient {
    base_url: String,
    http: reqwest::Client,
    session: SessionManager,
}

impl AuthorizedClient {
    /// Build a client using the base URL and timeout of the session's config
    pub fn new(session: SessionManager) -> ApiResult<Self> {
        let config = session.config();
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            http,
            session,
        })
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> SessionResult<T> {
        self.execute(Method::GET, path, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> SessionResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::POST, path, Some(encode(body)?)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> SessionResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::PUT, path, Some(encode(body)?)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> SessionResult<T> {
        self.execute(Method::DELETE, path, None).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> SessionResult<T> {
        let url = join_url(&self.base_url, path);

        let sent_with = self.session.access_token();
        let first = self.send(method.clone(), &url, body.as_ref(), sent_with.as_deref()).await;
        let value = match first {
            Err(ApiError::Unauthorized { .. }) => {
                debug!("{} {} answered 401, refreshing", method, url);
                match self.session.refresh_if_current(sent_with.as_deref()).await {
                    Ok(RefreshStatus::Refreshed) => {
                        info!("Retrying {} {} with refreshed token", method, url);
                        let token = self.session.access_token();
                        self.send(method, &url, body.as_ref(), token.as_deref()).await?
                    }
                    Ok(RefreshStatus::Skipped) => {
                        debug!("Session cannot be refreshed, giving up on {} {}", method, url);
                        return Err(SessionError::NotAuthenticated);
                    }
                    Err(e) => {
                        debug!("Refresh after 401 failed: {}", e);
                        return Err(SessionError::NotAuthenticated);
                    }
                }
            }
            other => other?,
        };

        decode(value)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> ApiResult<Value> {
        send_json(&self.http, method, url, body, token).await
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> SessionResult<Value> {
    serde_json::to_value(body)
        .map_err(|e| SessionError::InvalidInput(format!("Request body is not valid JSON: {}", e)))
}

fn decode<T: DeserializeOwned>(value: Value) -> SessionResult<T> {
    serde_json::from_value(value).map_err(|e| {
        SessionError::Api(ApiError::MalformedResponse(format!(
            "Unexpected response shape: {}",
            e
        )))
    })
}
