//! Mock objects and fake implementations for testing
//!
//! [`MockOidcClient`] plays the identity-provider adapter from a script so the
//! session manager can be driven through every transition without a network.
//! [`FakeBrowserHost`] stands in for the browser under the Keycloak adapter.

use crate::oidc::{
    BrowserHost, CallbackParams, OidcClient, OidcError, RenewResult, SilentInitResult,
};
use crate::settings::ProviderSettings;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use url::Url;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// How the mock answers `init_silent`
#[derive(Debug, Clone)]
pub enum InitBehavior {
    Respond(Result<SilentInitResult, OidcError>),
    /// Never answers
    Hang,
}

/// How the mock answers one `renew` call
#[derive(Debug)]
pub enum RenewBehavior {
    Respond(Result<RenewResult, OidcError>),
    /// Answer after the given (Tokio) delay
    Delay(Duration, Result<RenewResult, OidcError>),
    /// Answer once the gate is notified
    Gated(Arc<Notify>, Result<RenewResult, OidcError>),
    /// Never answers
    Hang,
}

/// Scripted [`OidcClient`]
///
/// Renewal behaviors are consumed in order; once the script is empty every
/// further `renew` fails with a network error.
pub struct MockOidcClient {
    init: Mutex<InitBehavior>,
    renewals: Mutex<VecDeque<RenewBehavior>>,
    logout_result: Mutex<Result<(), OidcError>>,
    init_calls: AtomicUsize,
    renew_calls: AtomicUsize,
    login_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    last_min_validity: AtomicU64,
}

impl MockOidcClient {
    /// Silent check finds no session; no renewals scripted
    #[must_use]
    pub fn new() -> Self {
        Self {
            init: Mutex::new(InitBehavior::Respond(Ok(SilentInitResult::unauthenticated()))),
            renewals: Mutex::new(VecDeque::new()),
            logout_result: Mutex::new(Ok(())),
            init_calls: AtomicUsize::new(0),
            renew_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            last_min_validity: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_init(self, result: Result<SilentInitResult, OidcError>) -> Self {
        *lock(&self.init) = InitBehavior::Respond(result);
        self
    }

    #[must_use]
    pub fn with_init_hang(self) -> Self {
        *lock(&self.init) = InitBehavior::Hang;
        self
    }

    #[must_use]
    pub fn with_renewal(self, behavior: RenewBehavior) -> Self {
        self.push_renewal(behavior);
        self
    }

    #[must_use]
    pub fn with_logout_result(self, result: Result<(), OidcError>) -> Self {
        *lock(&self.logout_result) = result;
        self
    }

    /// Append a renewal behavior after the mock is shared
    pub fn push_renewal(&self, behavior: RenewBehavior) {
        lock(&self.renewals).push_back(behavior);
    }

    #[must_use]
    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn renew_calls(&self) -> usize {
        self.renew_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    /// `min_validity_seconds` passed to the most recent `renew`
    #[must_use]
    pub fn last_min_validity(&self) -> u64 {
        self.last_min_validity.load(Ordering::SeqCst)
    }
}

impl Default for MockOidcClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OidcClient for MockOidcClient {
    async fn init_silent(&self, _config: &ProviderSettings) -> Result<SilentInitResult, OidcError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        let behavior = lock(&self.init).clone();
        match behavior {
            InitBehavior::Respond(result) => result,
            InitBehavior::Hang => std::future::pending().await,
        }
    }

    async fn renew(&self, min_validity_seconds: u64) -> Result<RenewResult, OidcError> {
        self.renew_calls.fetch_add(1, Ordering::SeqCst);
        self.last_min_validity.store(min_validity_seconds, Ordering::SeqCst);

        let behavior = lock(&self.renewals).pop_front();
        match behavior {
            Some(RenewBehavior::Respond(result)) => result,
            Some(RenewBehavior::Delay(delay, result)) => {
                tokio::time::sleep(delay).await;
                result
            }
            Some(RenewBehavior::Gated(gate, result)) => {
                gate.notified().await;
                result
            }
            Some(RenewBehavior::Hang) => std::future::pending().await,
            None => Err(OidcError::Network("no scripted renewal".to_string())),
        }
    }

    async fn interactive_login(&self) -> Result<(), OidcError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn interactive_logout(&self) -> Result<(), OidcError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.logout_result).clone()
    }
}

/// What the hidden frame lands on during the silent check
#[derive(Debug, Clone)]
enum SilentResponse {
    /// Echo the request's `state` back with these values
    Echo {
        code: Option<String>,
        error: Option<String>,
    },
    /// Return exactly these parameters
    Fixed(CallbackParams),
    Fail(OidcError),
}

/// In-memory [`BrowserHost`] that records navigations
pub struct FakeBrowserHost {
    silent: Mutex<SilentResponse>,
    callback: Mutex<Option<CallbackParams>>,
    storage: Mutex<HashMap<String, String>>,
    redirects: Mutex<Vec<Url>>,
    silent_requests: Mutex<Vec<Url>>,
}

impl FakeBrowserHost {
    /// No provider session: the silent check answers `login_required`
    #[must_use]
    pub fn new() -> Self {
        Self {
            silent: Mutex::new(SilentResponse::Echo {
                code: None,
                error: Some("login_required".to_string()),
            }),
            callback: Mutex::new(None),
            storage: Mutex::new(HashMap::new()),
            redirects: Mutex::new(Vec::new()),
            silent_requests: Mutex::new(Vec::new()),
        }
    }

    /// Silent check returns an authorization code with the matching state
    #[must_use]
    pub fn with_silent_code(self, code: &str) -> Self {
        *lock(&self.silent) = SilentResponse::Echo {
            code: Some(code.to_string()),
            error: None,
        };
        self
    }

    /// Silent check returns an error with the matching state
    #[must_use]
    pub fn with_silent_error(self, error: &str) -> Self {
        *lock(&self.silent) = SilentResponse::Echo {
            code: None,
            error: Some(error.to_string()),
        };
        self
    }

    /// Silent check returns fixed parameters regardless of the request
    #[must_use]
    pub fn with_silent_params(self, params: CallbackParams) -> Self {
        *lock(&self.silent) = SilentResponse::Fixed(params);
        self
    }

    #[must_use]
    pub fn with_silent_failure(self, err: OidcError) -> Self {
        *lock(&self.silent) = SilentResponse::Fail(err);
        self
    }

    /// Simulate a page load at the login redirect target
    pub fn set_callback(&self, params: Option<CallbackParams>) {
        *lock(&self.callback) = params;
    }

    #[must_use]
    pub fn redirects(&self) -> Vec<Url> {
        lock(&self.redirects).clone()
    }

    #[must_use]
    pub fn silent_requests(&self) -> Vec<Url> {
        lock(&self.silent_requests).clone()
    }

    #[must_use]
    pub fn stored(&self, key: &str) -> Option<String> {
        lock(&self.storage).get(key).cloned()
    }
}

impl Default for FakeBrowserHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Value of query parameter `key` in `url`
#[must_use]
pub fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

#[async_trait]
impl BrowserHost for FakeBrowserHost {
    async fn redirect(&self, url: &Url) -> Result<(), OidcError> {
        lock(&self.redirects).push(url.clone());
        Ok(())
    }

    async fn silent_check(&self, url: &Url) -> Result<CallbackParams, OidcError> {
        lock(&self.silent_requests).push(url.clone());
        let response = lock(&self.silent).clone();
        match response {
            SilentResponse::Echo { code, error } => Ok(CallbackParams {
                code,
                state: query_param(url, "state"),
                error,
                error_description: None,
            }),
            SilentResponse::Fixed(params) => Ok(params),
            SilentResponse::Fail(err) => Err(err),
        }
    }

    fn callback_params(&self) -> Option<CallbackParams> {
        lock(&self.callback).clone()
    }

    fn store(&self, key: &str, value: &str) {
        lock(&self.storage).insert(key.to_string(), value.to_string());
    }

    fn take(&self, key: &str) -> Option<String> {
        lock(&self.storage).remove(key)
    }
}
