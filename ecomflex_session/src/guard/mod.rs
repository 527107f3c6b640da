//! Navigation guard.
//!
//! Every navigation attempt resolves to exactly one [`Navigation`]:
//! proceed, redirect to login carrying the intended path, or redirect to the
//! landing page of the current role.

pub mod routes;

pub use routes::{CATCH_ALL, RouteRecord, RouteRequirement, RouteTable};

use crate::auth::{Role, SessionManager, SessionSnapshot};
use log::debug;

/// Login page path
pub const LOGIN_PATH: &str = "/auth/login";

/// Read access to the session, the only capability the guard needs
pub trait SessionView {
    fn snapshot(&self) -> SessionSnapshot;
}

impl SessionView for SessionManager {
    fn snapshot(&self) -> SessionSnapshot {
        SessionManager::snapshot(self)
    }
}

impl SessionView for SessionSnapshot {
    fn snapshot(&self) -> SessionSnapshot {
        *self
    }
}

/// Outcome of a navigation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    /// Send the user to the login page; `redirect` is where they were going
    RedirectToLogin { redirect: String },
    /// Send the user to the landing page of their role
    RedirectToRoleHome { path: &'static str },
}

/// Landing page for a role
pub fn role_home(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::Admin) => "/admin/dashboard",
        Some(Role::Influencer) => "/influencer/dashboard",
        _ => "/home",
    }
}

/// Decide a navigation to `target` with requirement `requirement`
pub fn decide(requirement: RouteRequirement, snapshot: &SessionSnapshot, target: &str) -> Navigation {
    if requirement.requires_auth && !snapshot.is_authenticated {
        return Navigation::RedirectToLogin {
            redirect: target.to_string(),
        };
    }

    match requirement.role {
        Some(required) if snapshot.role != Some(required) => Navigation::RedirectToRoleHome {
            path: role_home(snapshot.role),
        },
        _ => Navigation::Proceed,
    }
}

/// Route guard bound to a session view and a route table
#[derive(Debug, Clone)]
pub struct RouteGuard<V> {
    session: V,
    routes: RouteTable,
}

impl<V: SessionView> RouteGuard<V> {
    pub fn new(session: V, routes: RouteTable) -> Self {
        Self { session, routes }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Check a navigation to `target` (path with optional query string)
    pub fn check(&self, target: &str) -> Navigation {
        let requirement = self.routes.requirement(target);
        let snapshot = self.session.snapshot();
        let outcome = decide(requirement, &snapshot, target);
        debug!(
            "Navigation to {} (requirement: {:?}, authenticated: {}, role: {:?}) -> {:?}",
            target, requirement, snapshot.is_authenticated, snapshot.role, outcome
        );
        outcome
    }

    /// Where to go after a successful login.
    ///
    /// Resumes `redirect` when it is a site-relative path other than an auth
    /// page and the guard lets the user through; otherwise lands on the role home.
    pub fn post_login_destination(&self, redirect: Option<&str>) -> String {
        let snapshot = self.session.snapshot();
        let home = role_home(snapshot.role).to_string();

        let Some(redirect) = redirect.map(str::trim) else {
            return home;
        };

        if !is_site_relative(redirect) || redirect.starts_with("/auth/") {
            return home;
        }

        match self.check(redirect) {
            Navigation::Proceed => redirect.to_string(),
            _ => home,
        }
    }
}

/// A path on this site. Browsers read `\` as `/` and drop tabs and
/// newlines, so either can turn `/x` into a protocol-relative `//host`.
fn is_site_relative(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.chars().any(|c| c == '\\' || c.is_control())
}
