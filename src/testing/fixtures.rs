//! Test fixtures providing pre-built test objects

use crate::oidc::{OidcClient, RenewResult, SilentInitResult};
use crate::session::SessionLifecycleManager;
use crate::settings::{ClimaSettings, ProviderSettings, SessionSettings};
use chrono::{Duration, Utc};
use std::sync::Arc;

use super::builders::TestIdTokenBuilder;
use super::constants::{TEST_CLIENT_ID, TEST_PROVIDER_URL, TEST_REALM, TEST_SILENT_CHECK_URI};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Complete provider settings for the test realm
    #[must_use]
    pub fn provider_settings() -> ProviderSettings {
        ProviderSettings {
            url: TEST_PROVIDER_URL.to_string(),
            realm: TEST_REALM.to_string(),
            client_id: Some(TEST_CLIENT_ID.to_string()),
            silent_check_sso_redirect_uri: TEST_SILENT_CHECK_URI.to_string(),
            ..Default::default()
        }
    }

    /// Provider settings pointing at a closed local port
    #[must_use]
    pub fn unreachable_provider_settings() -> ProviderSettings {
        ProviderSettings {
            url: "http://127.0.0.1:9".to_string(),
            ..Self::provider_settings()
        }
    }

    /// Default session settings (30 s margin, 10 s timeouts)
    #[must_use]
    pub fn session_settings() -> SessionSettings {
        SessionSettings::default()
    }

    #[must_use]
    pub fn settings() -> ClimaSettings {
        ClimaSettings {
            provider: Self::provider_settings(),
            session: Self::session_settings(),
            ..Default::default()
        }
    }

    /// Manager over `client` with the default test settings
    #[must_use]
    pub fn manager(client: Arc<dyn OidcClient>) -> SessionLifecycleManager {
        SessionLifecycleManager::from_settings(&Self::settings(), client)
    }

    /// Silent check that found a session; token `token` expires in `expires_in_seconds`
    #[must_use]
    pub fn silent_authenticated(token: &str, expires_in_seconds: i64) -> SilentInitResult {
        SilentInitResult {
            authenticated: true,
            access_token: Some(token.to_string()),
            access_token_expiry: Some(Utc::now() + Duration::seconds(expires_in_seconds)),
            id_claims: Some(TestIdTokenBuilder::new().claims()),
        }
    }

    /// Successful refresh returning `token` valid for `expires_in_seconds`
    #[must_use]
    pub fn renewed(token: &str, expires_in_seconds: i64) -> RenewResult {
        RenewResult {
            refreshed: true,
            access_token: Some(token.to_string()),
            access_token_expiry: Some(Utc::now() + Duration::seconds(expires_in_seconds)),
            id_claims: None,
        }
    }

    /// Provider answer meaning "current token is still valid"
    #[must_use]
    pub fn not_refreshed() -> RenewResult {
        RenewResult::default()
    }
}
