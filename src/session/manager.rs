//! Session Lifecycle Manager
//!
//! `SessionLifecycleManager` is the single source of truth for the
//! authentication state of one application instance. It owns exactly one
//! session, drives it through silent recovery, renewal and forced
//! sign-out, and hands out access tokens that are valid for at least the
//! configured safety margin.
//!
//! ## Lifecycle
//!
//! construct → [`initialize`](SessionLifecycleManager::initialize) → operate →
//! [`dispose`](SessionLifecycleManager::dispose). Dropping the last handle
//! disposes implicitly.
//!
//! ## Organization
//!
//! 1. **Types** - Manager handle and shared state
//! 2. **Construction** - Creation from settings
//! 3. **Initialization** - Silent session recovery
//! 4. **Token Access** - Valid-token retrieval and serialized renewal
//! 5. **Sign-in / Sign-out** - Provider redirects and teardown
//! 6. **Reads** - Non-blocking status and claims accessors
//! 7. **Tests**

use crate::oidc::{Claims, OidcClient, OidcError, RenewResult, SilentInitResult};
use crate::session::error::{RenewalFailure, SessionError};
use crate::session::scheduler::{self, RenewalPlan, RenewalTrigger};
use crate::session::state::{
    AccessGrant, Phase, RenewalAttempt, Session, SessionSnapshot, SessionStatus,
};
use crate::settings::{ClimaSettings, ProviderSettings, SessionSettings};
use crate::utils::logging::LoggingHelper;
use chrono::Utc;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

// =============================================================================
// Types
// =============================================================================

/// Cheaply cloneable handle to one authentication session
///
/// All clones share the same session, renewal guard and scheduler.
#[derive(Clone)]
pub struct SessionLifecycleManager {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    provider: ProviderSettings,
    settings: SessionSettings,
    client: Arc<dyn OidcClient>,
    session: RwLock<Session>,
    /// Held for the whole provider round trip so at most one renewal is in flight
    renewal_lock: tokio::sync::Mutex<()>,
    /// Incremented each time a renewal outcome has been applied
    renewal_generation: AtomicU64,
    /// Wakes the scheduler whenever the session changes
    changed: Arc<Notify>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
    initialized: AtomicBool,
    disposed: AtomicBool,
}

impl fmt::Debug for SessionLifecycleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionLifecycleManager")
            .field("status", &self.status())
            .field("realm", &self.inner.provider.realm)
            .field("safety_margin_seconds", &self.inner.settings.safety_margin_seconds())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Construction
// =============================================================================

impl SessionLifecycleManager {
    /// Create a manager in `Initializing`; nothing is contacted until
    /// [`initialize`](Self::initialize) runs
    #[must_use]
    pub fn new(
        provider: ProviderSettings,
        settings: SessionSettings,
        client: Arc<dyn OidcClient>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                settings,
                client,
                session: RwLock::new(Session::new()),
                renewal_lock: tokio::sync::Mutex::new(()),
                renewal_generation: AtomicU64::new(0),
                changed: Arc::new(Notify::new()),
                scheduler: Mutex::new(None),
                initialized: AtomicBool::new(false),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &ClimaSettings, client: Arc<dyn OidcClient>) -> Self {
        Self::new(settings.provider.clone(), settings.session.clone(), client)
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Attempt silent session recovery and start the renewal scheduler
    ///
    /// Recovery failures and timeouts are logged and leave the manager
    /// `Unauthenticated`; they are not returned. Calling this more than once,
    /// or after [`dispose`](Self::dispose), returns the current status without
    /// contacting the provider.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Configuration`] if the provider settings are
    /// incomplete. The manager still resolves to `Unauthenticated` and the
    /// provider is never contacted.
    pub async fn initialize(&self) -> Result<SessionStatus, SessionError> {
        if self.inner.disposed.load(Ordering::SeqCst)
            || self.inner.initialized.swap(true, Ordering::SeqCst)
        {
            return Ok(self.status());
        }

        if let Err(msg) = self.inner.provider.validate() {
            let err = SessionError::Configuration(msg);
            LoggingHelper::log_session_error(&err);
            self.inner.transition("configuration error", Session::clear);
            return Err(err);
        }

        let epoch = self.inner.read_session().epoch;
        let timeout = self.inner.settings.init_timeout();
        let outcome = match tokio::time::timeout(
            timeout,
            self.inner.client.init_silent(&self.inner.provider),
        )
        .await
        {
            Ok(Ok(result)) => Self::grant_from_silent(result),
            // Malformed values only the adapter can detect, e.g. an unparsable URL
            Ok(Err(OidcError::Configuration(msg))) => {
                let err = SessionError::Configuration(msg);
                LoggingHelper::log_session_error(&err);
                self.inner.transition("configuration error", Session::clear);
                return Err(err);
            }
            Ok(Err(err)) => Err(SessionError::SilentRecovery(err)),
            Err(_) => Err(SessionError::SilentRecovery(OidcError::Network(format!(
                "no response within {}s",
                timeout.as_secs()
            )))),
        };

        {
            let mut session = self.inner.write_session();
            if session.epoch != epoch {
                LoggingHelper::log_renewal_discarded("session changed during silent recovery");
                if session.phase == Phase::Initializing {
                    session.clear();
                }
            } else {
                let from = session.phase;
                match outcome {
                    Ok(Some((grant, claims))) => {
                        LoggingHelper::log_silent_recovery(true, Some(grant.expires_at()));
                        session.authenticate(grant, claims);
                    }
                    Ok(None) => {
                        LoggingHelper::log_silent_recovery(false, None);
                        session.clear();
                    }
                    Err(err) => {
                        LoggingHelper::log_session_error(&err);
                        session.clear();
                    }
                }
                LoggingHelper::log_transition(from, session.phase, "silent recovery");
            }
        }
        self.inner.changed.notify_one();

        if !self.inner.disposed.load(Ordering::SeqCst) {
            let handle = scheduler::spawn(&self.inner);
            if let Some(previous) = self.inner.lock_scheduler().replace(handle) {
                previous.abort();
            }
        }

        Ok(self.status())
    }

    /// An `authenticated` result without both token and expiry, or with a
    /// token that has already expired, cannot be used
    fn grant_from_silent(
        result: SilentInitResult,
    ) -> Result<Option<(AccessGrant, Claims)>, SessionError> {
        if !result.authenticated {
            return Ok(None);
        }
        match (result.access_token, result.access_token_expiry) {
            (Some(_), Some(expiry)) if expiry <= Utc::now() => {
                Err(SessionError::SilentRecovery(OidcError::InvalidResponse(
                    "access token already expired".to_string(),
                )))
            }
            (Some(token), Some(expiry)) if !token.is_empty() => Ok(Some((
                AccessGrant::new(token, expiry),
                result.id_claims.unwrap_or_default(),
            ))),
            _ => Err(SessionError::SilentRecovery(OidcError::InvalidResponse(
                "authenticated without access token and expiry".to_string(),
            ))),
        }
    }

    // =========================================================================
    // Token Access
    // =========================================================================

    /// Return a token valid for at least the safety margin, renewing if needed
    ///
    /// Returns `None` when there is no session, while still initializing, or
    /// when renewal failed (the session has then already been cleared).
    /// Concurrent callers share a single renewal round trip.
    pub async fn get_valid_access_token(&self) -> Option<String> {
        // Generation first: a renewal applied after this load is visible below
        let generation = self.inner.renewal_generation.load(Ordering::SeqCst);
        {
            let session = self.inner.read_session();
            if session.phase != Phase::Authenticated {
                return None;
            }
            let margin = self.inner.settings.safety_margin();
            if let Some(grant) = session.usable_grant(margin, Utc::now()) {
                return Some(grant.token().to_string());
            }
        }
        self.inner
            .renew_serialized(generation, RenewalTrigger::Caller)
            .await
    }

    // =========================================================================
    // Sign-in / Sign-out
    // =========================================================================

    /// Hand control to the provider's interactive login
    ///
    /// Any local session is cleared first, as on sign-out; a completed login is
    /// observed on the next [`initialize`](Self::initialize). Any renewal still
    /// in flight is discarded when it completes.
    pub async fn sign_in(&self) {
        LoggingHelper::log_sign_in();
        self.inner.transition("sign-in", |session| {
            session.epoch += 1;
            session.clear();
        });
        if let Err(err) = self.inner.client.interactive_login().await {
            LoggingHelper::log_session_error(&SessionError::ProviderRedirect(err));
        }
    }

    /// Clear the local session and start the provider's logout
    ///
    /// Idempotent: when already signed out only the provider logout is
    /// repeated. Any renewal still in flight is discarded when it completes.
    pub async fn sign_out(&self) {
        let was_authenticated = self.inner.read_session().phase == Phase::Authenticated;
        LoggingHelper::log_sign_out(was_authenticated);
        self.inner.transition("sign-out", |session| {
            session.epoch += 1;
            session.clear();
        });

        self.provider_logout().await;
    }

    /// Sign out only while `token` is still the session's access token
    ///
    /// Used when a downstream API refuses `token`: if a renewal has replaced
    /// it in the meantime the newer session is kept. Returns whether the
    /// session was signed out.
    pub async fn sign_out_if_current(&self, token: &str) -> bool {
        {
            let mut session = self.inner.write_session();
            let current = session
                .grant
                .as_ref()
                .is_some_and(|grant| grant.token() == token);
            if !current {
                return false;
            }
            LoggingHelper::log_sign_out(session.phase == Phase::Authenticated);
            let from = session.phase;
            session.epoch += 1;
            session.clear();
            LoggingHelper::log_transition(from, session.phase, "access token refused");
        }
        self.inner.changed.notify_one();
        self.provider_logout().await;
        true
    }

    async fn provider_logout(&self) {
        if self.inner.disposed.load(Ordering::SeqCst) {
            return;
        }
        if let Err(err) = self.inner.client.interactive_logout().await {
            LoggingHelper::log_session_error(&SessionError::ProviderRedirect(err));
        }
    }

    /// Cancel the renewal scheduler and discard the session
    ///
    /// A renewal in flight completes against the provider but its outcome is
    /// not applied. Safe to call more than once.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.abort_scheduler();
        self.inner.transition("disposed", |session| {
            session.epoch += 1;
            session.clear();
        });
        LoggingHelper::log_disposed();
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Authenticated with an access token that has not yet expired
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    /// Identity claims of the signed-in user, while their token is unexpired
    #[must_use]
    pub fn current_user(&self) -> Option<Claims> {
        self.inner.read_session().live_claims(Utc::now()).cloned()
    }

    /// An expired token reads as `Unauthenticated` even before renewal or
    /// the scheduler has cleared it
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.inner
            .read_session()
            .effective_phase(Utc::now())
            .public()
    }

    /// Consistent copy of status, claims and expiry taken under one lock
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.read_session().snapshot(Utc::now())
    }
}

impl Inner {
    pub(crate) fn read_session(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_scheduler(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn abort_scheduler(&self) {
        if let Some(handle) = self.lock_scheduler().take() {
            handle.abort();
        }
    }

    pub(crate) fn changed(&self) -> Arc<Notify> {
        Arc::clone(&self.changed)
    }

    /// Mutate the session under the write lock, log the phase change and wake
    /// the scheduler
    fn transition(&self, reason: &str, apply: impl FnOnce(&mut Session)) {
        {
            let mut session = self.write_session();
            let from = session.phase;
            apply(&mut session);
            if from != session.phase {
                LoggingHelper::log_transition(from, session.phase, reason);
            }
        }
        self.changed.notify_one();
    }

    /// When the scheduler should next renew, if there is anything to renew
    pub(crate) fn next_renewal(&self) -> Option<RenewalPlan> {
        let generation = self.renewal_generation.load(Ordering::SeqCst);
        let session = self.read_session();
        if session.phase != Phase::Authenticated {
            return None;
        }
        let expires_at = session.grant.as_ref()?.expires_at();
        let delay = expires_at
            .checked_sub_signed(self.settings.safety_margin())
            .and_then(|renew_at| (renew_at - Utc::now()).to_std().ok())
            .unwrap_or_default();
        Some(RenewalPlan {
            generation,
            delay,
            expires_at,
        })
    }

    /// Run one renewal round trip, or reuse the outcome of the one that
    /// completed while this caller waited for the guard
    pub(crate) async fn renew_serialized(
        &self,
        observed_generation: u64,
        trigger: RenewalTrigger,
    ) -> Option<String> {
        let _guard = self.renewal_lock.lock().await;
        let margin = self.settings.safety_margin();

        let epoch = {
            let session = self.read_session();
            if self.renewal_generation.load(Ordering::SeqCst) != observed_generation {
                LoggingHelper::log_renewal_joined();
                return session
                    .usable_grant(margin, Utc::now())
                    .map(|grant| grant.token().to_string());
            }
            if session.phase != Phase::Authenticated {
                return None;
            }
            if trigger == RenewalTrigger::Caller {
                if let Some(grant) = session.usable_grant(margin, Utc::now()) {
                    return Some(grant.token().to_string());
                }
            }
            session.epoch
        };

        LoggingHelper::log_renewal_start(trigger);
        let attempt = self.attempt_renewal().await;
        let token = self.apply_renewal(epoch, attempt);

        self.renewal_generation.fetch_add(1, Ordering::SeqCst);
        self.changed.notify_one();
        token
    }

    async fn attempt_renewal(&self) -> RenewalAttempt {
        let timeout = self.settings.renewal_timeout();
        let result = tokio::time::timeout(
            timeout,
            self.client.renew(self.settings.safety_margin_seconds()),
        )
        .await;

        match result {
            Ok(Ok(renewed)) => self.interpret_renewal(renewed),
            Ok(Err(err)) => RenewalAttempt::Failure(err.into()),
            Err(_) => RenewalAttempt::Failure(RenewalFailure::Timeout(timeout)),
        }
    }

    fn interpret_renewal(&self, renewed: RenewResult) -> RenewalAttempt {
        match (renewed.access_token, renewed.access_token_expiry) {
            (Some(token), Some(expiry)) if !token.is_empty() => RenewalAttempt::Success {
                grant: AccessGrant::new(token, expiry),
                claims: renewed.id_claims,
            },
            (None, None) if !renewed.refreshed => {
                // Provider says the current token is still good; hold it to the margin
                let session = self.read_session();
                match session.usable_grant(self.settings.safety_margin(), Utc::now()) {
                    Some(grant) => RenewalAttempt::Success {
                        grant: grant.clone(),
                        claims: None,
                    },
                    None => RenewalAttempt::Failure(RenewalFailure::NotRefreshed),
                }
            }
            _ => RenewalAttempt::Failure(RenewalFailure::InvalidResponse(
                "renewal response without access token and expiry".to_string(),
            )),
        }
    }

    /// Apply a renewal outcome under one write lock; failures force sign-out
    fn apply_renewal(&self, epoch: u64, attempt: RenewalAttempt) -> Option<String> {
        let mut session = self.write_session();
        if session.epoch != epoch {
            LoggingHelper::log_renewal_discarded("session was signed out or disposed meanwhile");
            return None;
        }
        if session.phase != Phase::Authenticated {
            LoggingHelper::log_renewal_discarded("session is no longer authenticated");
            return None;
        }

        let failure = match attempt {
            RenewalAttempt::Success { grant, .. }
                if !grant.is_valid_for(self.settings.safety_margin(), Utc::now()) =>
            {
                RenewalFailure::TokenInsideMargin
            }
            RenewalAttempt::Success { grant, claims } => {
                LoggingHelper::log_renewal_success(grant.expires_at(), grant.token().len());
                let token = grant.token().to_string();
                session.grant = Some(grant);
                if let Some(claims) = claims {
                    session.claims = Some(claims);
                }
                return Some(token);
            }
            RenewalAttempt::Failure(failure) => failure,
        };

        LoggingHelper::log_session_error(&SessionError::Renewal(failure));
        let from = session.phase;
        session.expire();
        LoggingHelper::log_transition(from, Phase::Expired, "renewal failed");
        LoggingHelper::log_transition(Phase::Expired, session.phase, "forced sign-out");
        None
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.abort_scheduler();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::atomic::AtomicUsize;

    /// Minimal in-module adapter; the scripted mock in `testing` covers the rest
    struct StaticClient {
        expires_in: i64,
        renew_calls: AtomicUsize,
        renew_error: Option<OidcError>,
    }

    #[async_trait]
    impl OidcClient for StaticClient {
        async fn init_silent(
            &self,
            _config: &ProviderSettings,
        ) -> Result<SilentInitResult, OidcError> {
            Ok(SilentInitResult {
                authenticated: true,
                access_token: Some("T".to_string()),
                access_token_expiry: Some(Utc::now() + Duration::seconds(self.expires_in)),
                id_claims: None,
            })
        }

        async fn renew(&self, _min_validity_seconds: u64) -> Result<RenewResult, OidcError> {
            self.renew_calls.fetch_add(1, Ordering::SeqCst);
            match &self.renew_error {
                Some(err) => Err(err.clone()),
                None => Ok(RenewResult {
                    refreshed: true,
                    access_token: Some("T2".to_string()),
                    access_token_expiry: Some(Utc::now() + Duration::seconds(3600)),
                    id_claims: None,
                }),
            }
        }

        async fn interactive_login(&self) -> Result<(), OidcError> {
            Ok(())
        }

        async fn interactive_logout(&self) -> Result<(), OidcError> {
            Err(OidcError::Host("redirect blocked".to_string()))
        }
    }

    fn provider() -> ProviderSettings {
        ProviderSettings {
            url: "https://keycloak.example.com".to_string(),
            realm: "myrealm".to_string(),
            client_id: Some("clima".to_string()),
            silent_check_sso_redirect_uri: "https://clima.example.com/silent-check-sso.html"
                .to_string(),
            ..Default::default()
        }
    }

    fn build(client: StaticClient) -> (SessionLifecycleManager, Arc<StaticClient>) {
        let client = Arc::new(client);
        let manager =
            SessionLifecycleManager::new(provider(), SessionSettings::default(), client.clone());
        (manager, client)
    }

    #[test]
    fn test_new_manager_starts_initializing() {
        let (manager, _) = build(StaticClient {
            expires_in: 3600,
            renew_calls: AtomicUsize::new(0),
            renew_error: None,
        });
        assert_eq!(manager.status(), SessionStatus::Initializing);
        assert!(!manager.is_authenticated());
        assert!(manager.current_user().is_none());
    }

    #[tokio::test]
    async fn test_token_before_initialize_is_none() {
        let (manager, client) = build(StaticClient {
            expires_in: 3600,
            renew_calls: AtomicUsize::new(0),
            renew_error: None,
        });
        assert!(manager.get_valid_access_token().await.is_none());
        assert_eq!(client.renew_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_caller_renewal_inside_margin() {
        let (manager, client) = build(StaticClient {
            expires_in: 10,
            renew_calls: AtomicUsize::new(0),
            renew_error: None,
        });
        manager.initialize().await.unwrap();

        assert_eq!(
            manager.get_valid_access_token().await.as_deref(),
            Some("T2")
        );
        assert_eq!(manager.status(), SessionStatus::Authenticated);
        assert_eq!(client.renew_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_refresh_forces_sign_out() {
        let (manager, _) = build(StaticClient {
            expires_in: 10,
            renew_calls: AtomicUsize::new(0),
            renew_error: Some(OidcError::Rejected {
                code: "invalid_grant".to_string(),
                description: Some("Session not active".to_string()),
            }),
        });
        manager.initialize().await.unwrap();

        assert!(manager.get_valid_access_token().await.is_none());
        assert_eq!(manager.status(), SessionStatus::Unauthenticated);
        assert!(manager.snapshot().expires_at.is_none());
    }

    #[tokio::test]
    async fn test_second_initialize_does_not_recontact_provider() {
        let (manager, _) = build(StaticClient {
            expires_in: 3600,
            renew_calls: AtomicUsize::new(0),
            renew_error: None,
        });
        assert_eq!(
            manager.initialize().await.unwrap(),
            SessionStatus::Authenticated
        );
        manager.sign_out().await;
        assert_eq!(
            manager.initialize().await.unwrap(),
            SessionStatus::Unauthenticated
        );
    }

    #[test]
    fn test_reads_agree_once_token_has_expired() {
        let (manager, _) = build(StaticClient {
            expires_in: 3600,
            renew_calls: AtomicUsize::new(0),
            renew_error: None,
        });
        manager.inner.write_session().authenticate(
            AccessGrant::new("T".to_string(), Utc::now() - Duration::seconds(60)),
            Claims::default(),
        );

        assert!(!manager.is_authenticated());
        assert_eq!(manager.status(), SessionStatus::Unauthenticated);
        assert!(manager.current_user().is_none());
        let snapshot = manager.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Unauthenticated);
        assert!(snapshot.claims.is_none());
    }

    #[tokio::test]
    async fn test_already_expired_silent_token_is_not_accepted() {
        let (manager, client) = build(StaticClient {
            expires_in: -60,
            renew_calls: AtomicUsize::new(0),
            renew_error: None,
        });
        assert_eq!(
            manager.initialize().await.unwrap(),
            SessionStatus::Unauthenticated
        );
        assert!(manager.current_user().is_none());
        assert!(manager.get_valid_access_token().await.is_none());
        assert_eq!(client.renew_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sign_in_clears_local_session() {
        let (manager, _) = build(StaticClient {
            expires_in: 3600,
            renew_calls: AtomicUsize::new(0),
            renew_error: None,
        });
        manager.initialize().await.unwrap();
        manager.sign_in().await;

        assert_eq!(manager.status(), SessionStatus::Unauthenticated);
        assert!(manager.get_valid_access_token().await.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_if_current_keeps_rotated_token() {
        let (manager, _) = build(StaticClient {
            expires_in: 3600,
            renew_calls: AtomicUsize::new(0),
            renew_error: None,
        });
        manager.initialize().await.unwrap();

        assert!(!manager.sign_out_if_current("superseded").await);
        assert_eq!(manager.status(), SessionStatus::Authenticated);

        assert!(manager.sign_out_if_current("T").await);
        assert_eq!(manager.status(), SessionStatus::Unauthenticated);
        assert!(!manager.sign_out_if_current("T").await);
    }

    #[tokio::test]
    async fn test_logout_redirect_failure_still_clears_session() {
        let (manager, _) = build(StaticClient {
            expires_in: 3600,
            renew_calls: AtomicUsize::new(0),
            renew_error: None,
        });
        manager.initialize().await.unwrap();
        manager.sign_out().await;
        assert!(!manager.is_authenticated());
        assert!(manager.current_user().is_none());
    }
}
