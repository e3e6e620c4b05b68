//! Identity-provider client contract
//!
//! The session manager never speaks the OIDC wire protocol itself. Everything it
//! needs from the identity provider goes through [`OidcClient`], so the manager
//! can be driven by the bundled Keycloak adapter in production and by a scripted
//! mock in tests.

use crate::oidc::claims::Claims;
use crate::settings::ProviderSettings;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors reported by an identity-provider adapter
#[derive(Debug, Clone, Error)]
pub enum OidcError {
    /// Provider settings are missing or malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transport-level failure talking to the provider
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered but refused the request (e.g. `invalid_grant`)
    #[error("Provider rejected request: {code}")]
    Rejected {
        code: String,
        description: Option<String>,
    },

    /// The provider answered with something we could not interpret
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// The `state` returned on the callback does not match the one we sent
    #[error("OAuth state mismatch")]
    StateMismatch,

    /// A host primitive (redirect, hidden frame, storage) failed
    #[error("Host error: {0}")]
    Host(String),
}

/// Outcome of the silent check-SSO performed on startup
#[derive(Debug, Clone, Default)]
pub struct SilentInitResult {
    pub authenticated: bool,
    pub access_token: Option<String>,
    pub access_token_expiry: Option<DateTime<Utc>>,
    pub id_claims: Option<Claims>,
}

impl SilentInitResult {
    /// No existing session at the provider
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::default()
    }
}

/// Outcome of a token renewal call
///
/// `refreshed == false` means the provider considers the current token valid
/// for at least the requested minimum; token fields may then be absent.
#[derive(Debug, Clone, Default)]
pub struct RenewResult {
    pub refreshed: bool,
    pub access_token: Option<String>,
    pub access_token_expiry: Option<DateTime<Utc>>,
    pub id_claims: Option<Claims>,
}

/// Capability contract consumed by the session manager
#[async_trait]
pub trait OidcClient: Send + Sync {
    /// Authorization Code + PKCE silent check-SSO
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The provider configuration is unusable
    /// - The provider cannot be reached
    /// - The callback or token response is invalid
    async fn init_silent(&self, config: &ProviderSettings)
        -> Result<SilentInitResult, OidcError>;

    /// Renew the access token if it expires within `min_validity_seconds`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - There is no refresh credential
    /// - The provider rejects the refresh credential
    /// - The provider cannot be reached
    async fn renew(&self, min_validity_seconds: u64) -> Result<RenewResult, OidcError>;

    /// Start the interactive, redirect-based login
    ///
    /// # Errors
    ///
    /// Returns an error if the redirect cannot be started
    async fn interactive_login(&self) -> Result<(), OidcError>;

    /// Start the provider's logout
    ///
    /// # Errors
    ///
    /// Returns an error if the redirect cannot be started
    async fn interactive_logout(&self) -> Result<(), OidcError>;
}
