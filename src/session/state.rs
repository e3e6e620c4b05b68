//! Session state model
//!
//! One [`Session`] lives inside each manager and is mutated in place under the
//! manager's lock. The access token and its expiry travel together as an
//! [`AccessGrant`], so one can never be present without the other.

use crate::oidc::Claims;
use crate::session::error::RenewalFailure;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

/// Status as seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    Initializing,
    Unauthenticated,
    Authenticated,
}

/// Internal lifecycle phase; `Expired` only exists inside the forced-clear path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Initializing,
    Unauthenticated,
    Authenticated,
    Expired,
}

impl Phase {
    pub(crate) fn public(self) -> SessionStatus {
        match self {
            Self::Initializing => SessionStatus::Initializing,
            Self::Unauthenticated | Self::Expired => SessionStatus::Unauthenticated,
            Self::Authenticated => SessionStatus::Authenticated,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Initializing => "Initializing",
            Self::Unauthenticated => "Unauthenticated",
            Self::Authenticated => "Authenticated",
            Self::Expired => "Expired",
        };
        f.write_str(label)
    }
}

/// Bearer token paired with its absolute expiry
#[derive(Clone, PartialEq, Eq)]
pub struct AccessGrant {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AccessGrant {
    #[must_use]
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the token outlives `now + margin`
    #[must_use]
    pub fn is_valid_for(&self, margin: Duration, now: DateTime<Utc>) -> bool {
        now.checked_add_signed(margin).is_some_and(|limit| self.expires_at > limit)
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

// Token text stays out of debug output and therefore out of logs
impl fmt::Debug for AccessGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGrant")
            .field("token_len", &self.token.len())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The authentication state owned by a manager
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) phase: Phase,
    pub(crate) grant: Option<AccessGrant>,
    pub(crate) claims: Option<Claims>,
    /// Bumped whenever an in-flight renewal must no longer be applied
    pub(crate) epoch: u64,
}

impl Session {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::Initializing,
            grant: None,
            claims: None,
            epoch: 0,
        }
    }

    /// Enter `Authenticated` with a fresh grant and claims
    pub(crate) fn authenticate(&mut self, grant: AccessGrant, claims: Claims) {
        self.phase = Phase::Authenticated;
        self.grant = Some(grant);
        self.claims = Some(claims);
    }

    /// Drop token, expiry and claims and settle in `Unauthenticated`
    pub(crate) fn clear(&mut self) {
        self.phase = Phase::Unauthenticated;
        self.grant = None;
        self.claims = None;
    }

    /// Forced-clear path after a failed renewal
    pub(crate) fn expire(&mut self) {
        self.phase = Phase::Expired;
        self.grant = None;
        self.claims = None;
        self.phase = Phase::Unauthenticated;
    }

    /// Grant usable for at least `margin`, if any
    pub(crate) fn usable_grant(
        &self,
        margin: Duration,
        now: DateTime<Utc>,
    ) -> Option<&AccessGrant> {
        if self.phase != Phase::Authenticated {
            return None;
        }
        self.grant.as_ref().filter(|g| g.is_valid_for(margin, now))
    }

    /// Phase as callers may observe it at `now`: an expired grant is never
    /// reported as `Authenticated`
    pub(crate) fn effective_phase(&self, now: DateTime<Utc>) -> Phase {
        let live = self.grant.as_ref().is_some_and(|grant| !grant.is_expired(now));
        match self.phase {
            Phase::Authenticated if !live => Phase::Unauthenticated,
            phase => phase,
        }
    }

    /// Claims of a session whose grant is still live at `now`
    pub(crate) fn live_claims(&self, now: DateTime<Utc>) -> Option<&Claims> {
        if self.effective_phase(now) == Phase::Authenticated {
            self.claims.as_ref()
        } else {
            None
        }
    }

    pub(crate) fn snapshot(&self, now: DateTime<Utc>) -> SessionSnapshot {
        let status = self.effective_phase(now).public();
        if status != SessionStatus::Authenticated {
            return SessionSnapshot {
                status,
                claims: None,
                expires_at: None,
            };
        }
        SessionSnapshot {
            status,
            claims: self.claims.clone(),
            expires_at: self.grant.as_ref().map(AccessGrant::expires_at),
        }
    }
}

/// Consistent, read-only copy of the session for views
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub claims: Option<Claims>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Outcome of one renewal call, consumed when applied to the session
#[derive(Debug, Clone)]
pub enum RenewalAttempt {
    Success {
        grant: AccessGrant,
        claims: Option<Claims>,
    },
    Failure(RenewalFailure),
}
