//! Client-side authentication state.
//!
//! This module implements the session lifecycle of the Ecomflex client:
//! - Login through the remote API, Google sign-in, or an optional network-free
//!   elevated-bypass identity for development setups
//! - Public and influencer registration
//! - Single-flight access token refresh
//! - Logout that is always locally authoritative
//! - Persistence and restore through a [`SessionStore`](crate::store::SessionStore)
//!
//! ## Example
//!
//! ```no_run
//! use ecomflex_session::api::HttpAuthApi;
//! use ecomflex_session::auth::SessionManager;
//! use ecomflex_session::config::SessionConfig;
//! use ecomflex_session::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::from_env()?;
//!     let api = Arc::new(HttpAuthApi::from_config(&config)?);
//!     let session = SessionManager::restore(api, Arc::new(MemoryStore::new()), config);
//!
//!     if session.login("user@example.com", "Password1").await.is_err() {
//!         println!("{}", session.last_error().unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;
pub mod strategy;
pub mod token;

pub use errors::{SessionError, SessionResult};
pub use manager::SessionManager;
pub use models::{
    AuthGrant, AuthPhase, Credentials, GoogleSignIn, InfluencerRegistration, PublicRegistration,
    RefreshStatus, RegisterRequest, Registration, Role, Session, SessionMode, SessionSnapshot,
    TokenPair, UserId, UserProfile,
};
pub use strategy::{BypassIdentity, LoginStrategy};
