//! Session lifecycle errors
//!
//! Only [`SessionError::Configuration`] ever reaches a caller (from
//! `initialize`). The other variants exist so failures can be classified in
//! logs before being turned into state transitions.

use crate::oidc::OidcError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Identity-provider settings missing or malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Silent check-SSO failed; treated as "no prior session"
    #[error("Silent session recovery failed: {0}")]
    SilentRecovery(#[source] OidcError),

    /// Renewal failed; the session has been cleared
    #[error("Token renewal failed: {0}")]
    Renewal(#[from] RenewalFailure),

    /// Starting a login/logout redirect failed
    #[error("Provider redirect failed: {0}")]
    ProviderRedirect(#[source] OidcError),
}

/// Why a renewal attempt did not produce a usable token
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenewalFailure {
    /// Transport failure or unusable response
    #[error("network error: {0}")]
    Network(String),

    /// Provider refused the refresh credential
    #[error("provider rejected refresh: {code}")]
    Rejected {
        code: String,
        description: Option<String>,
    },

    /// Provider answered with something that is not a usable token
    #[error("invalid renewal response: {0}")]
    InvalidResponse(String),

    /// Provider did not answer within the bounded wait
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// Provider claimed the current token is still valid but it is not
    #[error("provider did not refresh a token that is inside the safety margin")]
    NotRefreshed,

    /// Provider returned a token that already expires inside the safety margin
    #[error("renewed token expires inside the safety margin")]
    TokenInsideMargin,
}

impl RenewalFailure {
    /// Short label used in log lines so operators can tell failure classes apart
    #[must_use]
    pub fn class(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::InvalidResponse(_) => "invalid-response",
            Self::Rejected { .. } => "rejected",
            Self::Timeout(_) => "timeout",
            Self::NotRefreshed | Self::TokenInsideMargin => "stale-token",
        }
    }
}

impl From<OidcError> for RenewalFailure {
    fn from(err: OidcError) -> Self {
        match err {
            OidcError::Rejected { code, description } => Self::Rejected { code, description },
            OidcError::StateMismatch => Self::Rejected {
                code: "state_mismatch".to_string(),
                description: None,
            },
            OidcError::InvalidResponse(msg) => Self::InvalidResponse(msg),
            other => Self::Network(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_kept_distinct_from_network() {
        let rejected = RenewalFailure::from(OidcError::Rejected {
            code: "invalid_grant".to_string(),
            description: Some("Token is not active".to_string()),
        });
        assert_eq!(rejected.class(), "rejected");

        let network = RenewalFailure::from(OidcError::Network("connection refused".to_string()));
        assert_eq!(network.class(), "network");
        assert!(network.to_string().contains("connection refused"));
    }

    #[test]
    fn test_renewal_failure_converts_into_session_error() {
        let err: SessionError = RenewalFailure::Timeout(Duration::from_secs(10)).into();
        assert!(matches!(err, SessionError::Renewal(RenewalFailure::Timeout(_))));
        assert!(err.to_string().starts_with("Token renewal failed"));
    }
}
