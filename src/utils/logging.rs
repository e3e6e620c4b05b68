// Centralized logging for session lifecycle events
use crate::session::error::{RenewalFailure, SessionError};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::fmt::Display;
use std::time::Duration;

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log a session status transition
    pub fn log_transition(from: impl Display, to: impl Display, reason: &str) {
        info!("Session transition {from} -> {to} ({reason})");
    }

    /// Log the outcome of the silent check performed on startup
    pub fn log_silent_recovery(authenticated: bool, expires_at: Option<DateTime<Utc>>) {
        if authenticated {
            info!("Silent session recovery succeeded, access token expires at {expires_at:?}");
        } else {
            info!("Silent session recovery found no existing session");
        }
    }

    /// Log a classified session error at the level its severity calls for
    pub fn log_session_error(err: &SessionError) {
        match err {
            SessionError::Configuration(msg) => {
                error!("Identity provider configuration invalid: {msg}");
            }
            SessionError::SilentRecovery(source) => {
                warn!("Silent session recovery failed, continuing unauthenticated: {source}");
            }
            SessionError::Renewal(failure) => Self::log_renewal_failure(failure),
            SessionError::ProviderRedirect(source) => {
                error!("Failed to start provider redirect: {source}");
            }
        }
    }

    /// Log a renewal failure, keeping provider rejections apart from transport problems
    pub fn log_renewal_failure(failure: &RenewalFailure) {
        match failure {
            RenewalFailure::Rejected { code, description } => {
                warn!(
                    "Token renewal rejected by provider: {code} {} - forcing sign-out",
                    description.as_deref().unwrap_or("")
                );
            }
            other => {
                warn!(
                    "Token renewal failed [{}]: {other} - forcing sign-out",
                    other.class()
                );
            }
        }
    }

    pub fn log_renewal_start(trigger: impl Display) {
        debug!("Starting token renewal ({trigger})");
    }

    pub fn log_renewal_success(expires_at: DateTime<Utc>, token_len: usize) {
        info!("Token renewed: new token ({token_len} chars) expires at {expires_at}");
    }

    /// Log a renewal result that arrived after the session moved on
    pub fn log_renewal_discarded(reason: &str) {
        info!("Discarding renewal result: {reason}");
    }

    pub fn log_renewal_joined() {
        debug!("Renewal already completed by a concurrent caller, reusing its outcome");
    }

    pub fn log_renewal_scheduled(delay: Duration, expires_at: DateTime<Utc>) {
        debug!(
            "Next proactive renewal in {}s (token expires at {expires_at})",
            delay.as_secs()
        );
    }

    pub fn log_sign_in() {
        info!("Starting interactive sign-in");
    }

    pub fn log_sign_out(was_authenticated: bool) {
        if was_authenticated {
            info!("Signing out authenticated session");
        } else {
            debug!("Sign-out requested without an authenticated session");
        }
    }

    pub fn log_disposed() {
        info!("Session manager disposed, renewal scheduler cancelled");
    }
}
