//! Session manager implementation.

use super::{
    errors::{SessionError, SessionResult},
    models::{
        AuthGrant, AuthPhase, Credentials, GoogleSignIn, InfluencerRegistration, PublicRegistration,
        RefreshStatus, RegisterRequest, Registration, Role, Session, SessionMode, SessionSnapshot,
        UserProfile,
    },
    strategy::{BypassIdentity, LoginStrategy},
    token,
};
use crate::api::{ApiError, AuthApi};
use crate::config::SessionConfig;
use crate::store::{
    ACCESS_TOKEN_KEY, BYPASS_FLAG_KEY, PROFILE_KEY, REFRESH_TOKEN_KEY, ROLE_KEY, SessionStore,
    StoreResult,
};
use crate::validators;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type SharedRefresh = Shared<BoxFuture<'static, SessionResult<RefreshStatus>>>;

#[derive(Debug, Default)]
struct State {
    session: Session,
    phase: AuthPhase,
    last_error: Option<String>,
    /// Bumped whenever the session identity changes (login, logout).
    /// A refresh started under an older epoch must not commit.
    epoch: u64,
}

struct Inner {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
    state: RwLock<State>,
    refresh_slot: Mutex<Option<SharedRefresh>>,
}

impl Inner {
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self) -> MutexGuard<'_, Option<SharedRefresh>> {
        self.refresh_slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write every session key to match `session`
    fn persist(&self, session: &Session) -> StoreResult<()> {
        let store = self.store.as_ref();
        put(store, ACCESS_TOKEN_KEY, session.access_token.as_deref())?;
        put(store, REFRESH_TOKEN_KEY, session.refresh_token.as_deref())?;
        put(store, ROLE_KEY, session.effective_role().map(|r| r.as_str()))?;
        put(store, BYPASS_FLAG_KEY, session.is_bypass().then_some("true"))?;

        let profile = match &session.user {
            Some(user) => Some(serde_json::to_string(user).map_err(|e| {
                crate::store::StoreError::Serialization(format!("Failed to encode profile: {}", e))
            })?),
            None => None,
        };
        put(store, PROFILE_KEY, profile.as_deref())
    }

    fn is_placeholder(&self, session: &Session) -> bool {
        let prefix = &self.config.placeholder_prefix;
        session
            .access_token
            .iter()
            .chain(session.refresh_token.iter())
            .any(|t| token::is_placeholder(t, prefix))
    }
}

fn put(store: &dyn SessionStore, key: &str, value: Option<&str>) -> StoreResult<()> {
    match value {
        Some(value) => store.set(key, value),
        None => store.remove(key),
    }
}

/// Owner of the client-side authentication state.
///
/// The manager is the only component that writes tokens, either in memory or
/// to the [`SessionStore`]. Other components hold a clone and use the
/// read-only accessors or [`SessionManager::snapshot`].
///
/// Cloning is cheap; clones share the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Create a manager, restoring any session persisted in `store`.
    ///
    /// Store read failures are logged and the manager starts anonymous. The
    /// elevated-bypass flag is honored only when the stored role is admin and
    /// the bypass strategy is enabled in `config`; otherwise it is discarded.
    pub fn restore(
        api: Arc<dyn AuthApi>,
        store: Arc<dyn SessionStore>,
        config: SessionConfig,
    ) -> Self {
        let session = match load_session(store.as_ref(), config.elevated_bypass.as_ref()) {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to load stored session: {}. Starting anonymous.", e);
                Session::default()
            }
        };

        // An expired access token is kept with its refresh token so that
        // `refresh` can revive it, but the phase starts anonymous.
        let phase = if is_authenticated(&session) {
            AuthPhase::Authenticated
        } else {
            AuthPhase::Anonymous
        };

        match phase {
            AuthPhase::Authenticated => info!(
                "Restored {} session (role: {})",
                if session.is_bypass() { "elevated" } else { "normal" },
                session.effective_role().map(|r| r.as_str()).unwrap_or("unknown"),
            ),
            _ if session.access_token.is_some() => {
                info!("Stored access token has expired, starting anonymous until refreshed")
            }
            _ => debug!("No stored session, starting anonymous"),
        }

        Self {
            inner: Arc::new(Inner {
                api,
                store,
                config,
                state: RwLock::new(State {
                    session,
                    phase,
                    ..Default::default()
                }),
                refresh_slot: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    // ------------------------------------------------------------------
    // Read-only derivations
    // ------------------------------------------------------------------

    /// Whether the session proves identity: an elevated-bypass session, or a
    /// present access token that has not expired.
    pub fn is_authenticated(&self) -> bool {
        let state = self.inner.read();
        is_authenticated(&state.session)
    }

    /// Current role, if known
    pub fn role(&self) -> Option<Role> {
        self.inner.read().session.effective_role()
    }

    pub fn has_role(&self, expected: Role) -> bool {
        self.role() == Some(expected)
    }

    pub fn phase(&self) -> AuthPhase {
        self.inner.read().phase
    }

    pub fn mode(&self) -> SessionMode {
        self.inner.read().session.mode
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.inner.read().session.user.clone()
    }

    /// Normalized message of the last failed operation
    pub fn last_error(&self) -> Option<String> {
        self.inner.read().last_error.clone()
    }

    pub fn clear_error(&self) {
        self.inner.write().last_error = None;
    }

    /// Current access token, for attaching to API requests
    pub fn access_token(&self) -> Option<String> {
        self.inner.read().session.access_token.clone()
    }

    /// Consistent view of authentication and role for navigation guards
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.read();
        SessionSnapshot {
            is_authenticated: is_authenticated(&state.session),
            role: state.session.effective_role(),
            mode: state.session.mode,
        }
    }

    // ------------------------------------------------------------------
    // Login
    // ------------------------------------------------------------------

    /// Log in with email and password
    pub async fn login(&self, email: &str, password: &str) -> SessionResult<()> {
        self.login_with(Credentials::new(email, password)).await
    }

    /// Log in with full credentials, including an optional challenge proof.
    ///
    /// On failure the normalized message is recorded in
    /// [`last_error`](Self::last_error) and the previous session is left as it was.
    pub async fn login_with(&self, credentials: Credentials) -> SessionResult<()> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(self.fail(SessionError::InvalidInput(
                "Email and password are required".to_string(),
            )));
        }

        info!("Login attempt for {}", credentials.email.trim());
        let strategy =
            LoginStrategy::select(self.inner.config.elevated_bypass.as_ref(), credentials);
        self.run_login(strategy).await
    }

    /// Log in with a Google ID token. The backend creates the account on first
    /// use with the role carried in `sign_in`.
    pub async fn login_with_google(&self, sign_in: GoogleSignIn) -> SessionResult<()> {
        if sign_in.id_token.trim().is_empty() {
            return Err(self.fail(SessionError::InvalidInput(
                "Google sign-in did not return a token".to_string(),
            )));
        }

        info!("Google sign-in attempt (role: {})", sign_in.role);
        self.run_login(LoginStrategy::Google(sign_in)).await
    }

    async fn run_login(&self, strategy: LoginStrategy) -> SessionResult<()> {
        let previous_phase = {
            let mut state = self.inner.write();
            state.last_error = None;
            std::mem::replace(&mut state.phase, AuthPhase::Authenticating)
        };

        debug!("Using {} login strategy", strategy.name());
        let result = match strategy {
            LoginStrategy::ElevatedBypass(identity) => self.commit_bypass(&identity),
            LoginStrategy::Remote(credentials) => match self.inner.api.login(&credentials).await {
                Ok(grant) => self.commit_grant(grant, None),
                Err(e) => Err(SessionError::Api(e)),
            },
            LoginStrategy::Google(sign_in) => match self.inner.api.google_login(&sign_in).await {
                Ok(grant) => self.commit_grant(grant, None),
                Err(ApiError::Unauthorized { .. }) | Err(ApiError::Status { status: 400, .. }) => {
                    Err(SessionError::InvalidInput(
                        "Google authentication failed. Please try again.".to_string(),
                    ))
                }
                Err(e) => Err(SessionError::Api(e)),
            },
        };

        match result {
            Ok(()) => {
                info!("Login successful (role: {:?})", self.role());
                Ok(())
            }
            Err(e) => {
                warn!("Login failed: {}", e);
                self.inner.write().phase = previous_phase;
                Err(self.fail(e))
            }
        }
    }

    fn commit_bypass(&self, identity: &BypassIdentity) -> SessionResult<()> {
        warn!("Elevated bypass login for {}; no backend session exists", identity.email);

        let session = Session {
            access_token: None,
            refresh_token: None,
            user: Some(identity.profile()),
            role: Some(Role::Admin),
            mode: SessionMode::ElevatedBypass,
        };
        self.commit(session)
    }

    /// Commit a token grant. `fallback_user` is used when the grant has none.
    fn commit_grant(&self, grant: AuthGrant, fallback_user: Option<UserProfile>) -> SessionResult<()> {
        let user = grant.user.or(fallback_user);
        debug!(
            "Committing grant (access token: {} chars, refresh token: {} chars)",
            grant.tokens.access_token.len(),
            grant.tokens.refresh_token.len()
        );

        let session = Session {
            access_token: Some(grant.tokens.access_token),
            refresh_token: Some(grant.tokens.refresh_token),
            role: user.as_ref().map(|u| u.role),
            user,
            mode: SessionMode::Normal,
        };
        self.commit(session)
    }

    /// Replace the whole session, persisting first. All or nothing: if the
    /// store rejects the write, the previous session is written back and kept.
    fn commit(&self, session: Session) -> SessionResult<()> {
        let mut state = self.inner.write();

        if let Err(e) = self.inner.persist(&session) {
            error!("Failed to persist session: {}", e);
            if let Err(rollback) = self.inner.persist(&state.session) {
                error!("Failed to restore previous session in store: {}", rollback);
            }
            return Err(SessionError::Storage(e));
        }

        state.session = session;
        state.phase = AuthPhase::Authenticated;
        state.epoch += 1;
        state.last_error = None;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register a public user. Logs in when the backend returns tokens.
    pub async fn register_public(&self, registration: &PublicRegistration) -> SessionResult<Registration> {
        validate_registration(
            &registration.full_name,
            &registration.email,
            &registration.password,
            &registration.phone,
            registration.agree_to_terms,
        )
        .map_err(|e| self.fail(e))?;

        self.register(RegisterRequest::from(registration)).await
    }

    /// Register an influencer account. Logs in when the backend returns tokens.
    pub async fn register_influencer(
        &self,
        registration: &InfluencerRegistration,
    ) -> SessionResult<Registration> {
        validate_registration(
            &registration.full_name,
            &registration.email,
            &registration.password,
            &registration.phone,
            registration.agree_to_terms,
        )
        .map_err(|e| self.fail(e))?;

        self.register(RegisterRequest::from(registration)).await
    }

    async fn register(&self, request: RegisterRequest) -> SessionResult<Registration> {
        self.clear_error();
        info!("Registering {} account for {}", request.role, request.email);

        let registration = self
            .inner
            .api
            .register(&request)
            .await
            .map_err(|e| self.fail(SessionError::Api(e)))?;

        if let Some(grant) = registration.grant.clone() {
            self.commit_grant(grant, registration.user.clone())
                .map_err(|e| self.fail(e))?;
        }

        Ok(registration)
    }

    // ------------------------------------------------------------------
    // Refresh
    // ------------------------------------------------------------------

    /// Exchange the refresh token for a new access token.
    ///
    /// At most one refresh runs per manager: callers arriving while one is
    /// outstanding await the same result instead of issuing another request.
    /// A failed refresh logs the session out unless it is a development
    /// placeholder session.
    pub async fn refresh(&self) -> SessionResult<RefreshStatus> {
        let inflight = {
            let mut slot = self.inner.slot();
            self.join_or_start(&mut slot)
        };

        inflight.await
    }

    /// Refresh because a request sent with `stale_token` was rejected.
    ///
    /// If the access token has already moved on (another caller refreshed
    /// while the request was on the wire), no new refresh is started: the
    /// caller gets `Refreshed` and retries with the current token. A session
    /// that was logged out meanwhile yields `NotAuthenticated`.
    pub async fn refresh_if_current(&self, stale_token: Option<&str>) -> SessionResult<RefreshStatus> {
        let inflight = {
            let mut slot = self.inner.slot();
            if slot.is_none() {
                let current = self.inner.read().session.access_token.clone();
                if current.as_deref() != stale_token {
                    return match current {
                        Some(_) => {
                            debug!("Access token already replaced, not refreshing again");
                            Ok(RefreshStatus::Refreshed)
                        }
                        None => Err(SessionError::NotAuthenticated),
                    };
                }
            }
            self.join_or_start(&mut slot)
        };

        inflight.await
    }

    /// Join the refresh in `slot`, or start one and park it there
    fn join_or_start(&self, slot: &mut Option<SharedRefresh>) -> SharedRefresh {
        match slot.as_ref() {
            Some(inflight) => {
                debug!("Joining in-flight refresh");
                inflight.clone()
            }
            None => {
                let manager = self.clone();
                let fut = async move { manager.run_refresh().await }.boxed().shared();
                *slot = Some(fut.clone());
                fut
            }
        }
    }

    async fn run_refresh(&self) -> SessionResult<RefreshStatus> {
        let outcome = self.refresh_once().await;
        self.inner.slot().take();
        outcome
    }

    async fn refresh_once(&self) -> SessionResult<RefreshStatus> {
        let (refresh_token, placeholder, epoch, previous_phase) = {
            let mut state = self.inner.write();

            if state.session.is_bypass() {
                debug!("Elevated session, skipping refresh");
                return Ok(RefreshStatus::Skipped);
            }

            let prefix = &self.inner.config.placeholder_prefix;
            if state
                .session
                .access_token
                .as_deref()
                .is_some_and(|t| token::is_placeholder(t, prefix))
            {
                debug!("Placeholder access token, skipping refresh");
                return Ok(RefreshStatus::Skipped);
            }

            let Some(refresh_token) = state.session.refresh_token.clone() else {
                drop(state);
                return Err(self.fail(SessionError::NoRefreshToken));
            };

            let placeholder = self.inner.is_placeholder(&state.session);
            let previous_phase = std::mem::replace(&mut state.phase, AuthPhase::Refreshing);
            (refresh_token, placeholder, state.epoch, previous_phase)
        };

        info!("Refreshing access token");

        match self.inner.api.refresh(&refresh_token).await {
            Ok(tokens) => {
                let mut state = self.inner.write();
                if state.epoch != epoch {
                    info!("Session changed during refresh, discarding new token");
                    return Err(SessionError::NotAuthenticated);
                }

                let mut next = state.session.clone();
                next.access_token = Some(tokens.access_token);
                if let Some(rotated) = tokens.refresh_token {
                    next.refresh_token = Some(rotated);
                }

                if let Err(e) = self.inner.persist(&next) {
                    error!("Failed to persist refreshed token: {}", e);
                }

                state.session = next;
                state.phase = AuthPhase::Authenticated;
                state.last_error = None;
                info!("Access token refreshed");
                Ok(RefreshStatus::Refreshed)
            }
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                let still_current = self.inner.read().epoch == epoch;

                if placeholder {
                    info!("Placeholder session, keeping it after failed refresh");
                    if still_current {
                        self.inner.write().phase = previous_phase;
                    }
                } else if still_current {
                    self.logout().await;
                }

                Err(self.fail(SessionError::Api(e)))
            }
        }
    }

    // ------------------------------------------------------------------
    // Logout
    // ------------------------------------------------------------------

    /// End the session.
    ///
    /// Local state is authoritative: memory and the store are cleared
    /// unconditionally, then the backend is notified on a best-effort basis.
    pub async fn logout(&self) {
        let (access_token, refresh_token) = {
            let mut state = self.inner.write();
            let session = std::mem::take(&mut state.session);
            state.phase = AuthPhase::Anonymous;
            state.last_error = None;
            state.epoch += 1;

            if let Err(e) = self.inner.store.clear_session() {
                error!("Failed to clear stored session: {}", e);
            }

            (session.access_token, session.refresh_token)
        };

        info!("Logged out");

        if access_token.is_none() && refresh_token.is_none() {
            return;
        }

        if let Err(e) = self
            .inner
            .api
            .logout(access_token.as_deref(), refresh_token.as_deref())
            .await
        {
            warn!("Backend logout notification failed (ignored): {}", e);
        }
    }

    // ------------------------------------------------------------------
    // Profile and password reset
    // ------------------------------------------------------------------

    /// Reload the current user's profile from the backend
    pub async fn fetch_profile(&self) -> SessionResult<UserProfile> {
        let access_token = {
            let state = self.inner.read();
            if state.session.is_bypass() {
                if let Some(user) = &state.session.user {
                    return Ok(user.clone());
                }
            }
            state.session.access_token.clone()
        };

        let Some(access_token) = access_token else {
            return Err(self.fail(SessionError::NotAuthenticated));
        };

        let profile = self
            .inner
            .api
            .fetch_profile(&access_token)
            .await
            .map_err(|e| self.fail(SessionError::Api(e)))?;

        let mut state = self.inner.write();
        if state.session.access_token.as_deref() != Some(access_token.as_str()) {
            debug!("Session changed while fetching profile, not storing it");
            return Ok(profile);
        }

        let mut next = state.session.clone();
        next.role = Some(profile.role);
        next.user = Some(profile.clone());
        if let Err(e) = self.inner.persist(&next) {
            error!("Failed to persist profile: {}", e);
        }
        state.session = next;
        Ok(profile)
    }

    /// Ask the backend to send a password reset code to `email`
    pub async fn request_password_reset(&self, email: &str) -> SessionResult<()> {
        if !validators::is_valid_email(email) {
            return Err(self.fail(SessionError::InvalidInput(
                "Please enter a valid email address".to_string(),
            )));
        }

        self.clear_error();
        self.inner
            .api
            .request_password_reset(email.trim())
            .await
            .map_err(|e| self.fail(SessionError::Api(e)))
    }

    /// Set a new password with the token from the reset email
    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> SessionResult<()> {
        if token.trim().is_empty() {
            return Err(self.fail(SessionError::InvalidInput(
                "Reset code is required".to_string(),
            )));
        }
        if !validators::is_valid_password(new_password) {
            return Err(self.fail(SessionError::InvalidInput(
                validators::PASSWORD_REQUIREMENTS.to_string(),
            )));
        }

        self.clear_error();
        self.inner
            .api
            .confirm_password_reset(token.trim(), new_password)
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized { .. } | ApiError::Status { status: 400, .. } => {
                    SessionError::InvalidInput("Invalid or expired reset code".to_string())
                }
                other => SessionError::Api(other),
            })
            .map_err(|e| self.fail(e))
    }

    /// Record the normalized message of `err` and hand it back
    fn fail(&self, err: SessionError) -> SessionError {
        self.inner.write().last_error = Some(err.client_message());
        err
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.read();
        f.debug_struct("SessionManager")
            .field("phase", &state.phase)
            .field("mode", &state.session.mode)
            .field("role", &state.session.effective_role())
            .finish()
    }
}

fn is_authenticated(session: &Session) -> bool {
    session.is_bypass()
        || session
            .access_token
            .as_deref()
            .is_some_and(|t| !token::is_expired(t))
}

fn load_session(store: &dyn SessionStore, bypass: Option<&BypassIdentity>) -> StoreResult<Session> {
    let access_token = store.get(ACCESS_TOKEN_KEY)?.filter(|t| !t.is_empty());
    let refresh_token = store.get(REFRESH_TOKEN_KEY)?.filter(|t| !t.is_empty());
    let role = store.get(ROLE_KEY)?.and_then(|r| r.parse::<Role>().ok());

    let user = store.get(PROFILE_KEY)?.and_then(|json| {
        serde_json::from_str::<UserProfile>(&json)
            .map_err(|e| warn!("Discarding unreadable stored profile: {}", e))
            .ok()
    });

    let bypass_flag = store.get(BYPASS_FLAG_KEY)?.as_deref() == Some("true");
    if bypass_flag {
        if let (Some(identity), Some(Role::Admin)) = (bypass, role) {
            return Ok(Session {
                access_token: None,
                refresh_token: None,
                user: user.or_else(|| Some(identity.profile())),
                role: Some(Role::Admin),
                mode: SessionMode::ElevatedBypass,
            });
        }
        warn!("Discarding stored elevated-bypass flag");
        store.remove(BYPASS_FLAG_KEY)?;
        if access_token.is_none() {
            store.remove(ROLE_KEY)?;
            store.remove(PROFILE_KEY)?;
            return Ok(Session::default());
        }
    }

    Ok(Session {
        role: user.as_ref().map(|u| u.role).or(role),
        access_token,
        refresh_token,
        user,
        mode: SessionMode::Normal,
    })
}

fn validate_registration(
    full_name: &str,
    email: &str,
    password: &str,
    phone: &str,
    agree_to_terms: bool,
) -> SessionResult<()> {
    if full_name.trim().is_empty() {
        return Err(SessionError::InvalidInput("Full name is required".to_string()));
    }
    if !validators::is_valid_email(email) {
        return Err(SessionError::InvalidInput(
            "Please enter a valid email address".to_string(),
        ));
    }
    if !validators::is_valid_password(password) {
        return Err(SessionError::InvalidInput(
            validators::PASSWORD_REQUIREMENTS.to_string(),
        ));
    }
    if !validators::is_valid_phone(phone) {
        return Err(SessionError::InvalidInput(
            "Please enter a valid phone number".to_string(),
        ));
    }
    if !agree_to_terms {
        return Err(SessionError::InvalidInput(
            "You must accept the terms and conditions".to_string(),
        ));
    }
    Ok(())
}
