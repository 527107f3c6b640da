//! # Ecomflex Session
//!
//! Client-side session management for the Ecomflex marketplace.
//!
//! The crate owns everything a client needs to know about who is logged in:
//! acquiring tokens, keeping them fresh, persisting them across restarts,
//! and deciding whether a navigation may proceed.
//!
//! ## Core Modules
//!
//! - [`auth`]: [`SessionManager`], login strategies, tokens and session models
//! - [`api`]: The [`AuthApi`](api::AuthApi) seam, its HTTP implementation and
//!   response normalization
//! - [`store`]: Key-value persistence of the session
//! - [`guard`]: Route table and navigation guard
//! - [`client`]: Authorized JSON requests with refresh-and-retry on 401
//! - [`config`]: Environment-driven configuration
//!
//! ## Example
//!
//! ```
//! use ecomflex_session::guard::{Navigation, RouteGuard, RouteTable};
//! use ecomflex_session::auth::{SessionMode, SessionSnapshot};
//!
//! let anonymous = SessionSnapshot {
//!     is_authenticated: false,
//!     role: None,
//!     mode: SessionMode::Normal,
//! };
//! let guard = RouteGuard::new(anonymous, RouteTable::ecomflex());
//! assert_eq!(
//!     guard.check("/home"),
//!     Navigation::RedirectToLogin { redirect: "/home".to_string() }
//! );
//! ```

/// Remote authentication API and response normalization.
pub mod api;
pub use api::{ApiError, HttpAuthApi};

/// Session lifecycle, strategies and models.
pub mod auth;
pub use auth::{Role, SessionError, SessionManager, SessionMode, SessionSnapshot};

pub mod client;
pub use client::AuthorizedClient;

pub mod config;
pub use config::{ConfigError, SessionConfig};

/// Navigation guard.
pub mod guard;
pub use guard::{Navigation, RouteGuard, RouteTable};

pub mod store;
pub use store::{FileStore, MemoryStore, SessionStore};

pub mod validators;
