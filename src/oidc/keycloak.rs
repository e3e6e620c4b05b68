//! Keycloak adapter
//!
//! Implements [`OidcClient`] against a Keycloak realm using the Authorization
//! Code flow with PKCE (S256). Browser primitives (top-level redirect, hidden
//! frame for the silent check, session storage) are reached through
//! [`BrowserHost`] so the adapter itself stays host-agnostic.
//!
//! ID token signatures are not verified here; tokens come straight from the
//! realm's token endpoint over TLS and claims are only used for display.

use crate::oidc::claims::Claims;
use crate::oidc::client::{OidcClient, OidcError, RenewResult, SilentInitResult};
use crate::oidc::pkce::{self, PkcePair, CHALLENGE_METHOD};
use crate::settings::ProviderSettings;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use serde::Deserialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

/// Errors from a `prompt=none` request that only mean "nobody is signed in"
const NO_SESSION_ERRORS: [&str; 3] = ["login_required", "interaction_required", "consent_required"];

/// Lifetime assumed when the token response carries no `expires_in`
const DEFAULT_EXPIRES_IN_SECONDS: u64 = 3600;

const STATE_KEY: &str = "clima.oidc.state";
const NONCE_KEY: &str = "clima.oidc.nonce";
const VERIFIER_KEY: &str = "clima.oidc.verifier";
const REDIRECT_URI_KEY: &str = "clima.oidc.redirect_uri";

// =============================================================================
// Browser host
// =============================================================================

/// Parameters the provider appended to a redirect URI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Read callback parameters from the query, falling back to the fragment
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        let from_query = Self::from_pairs(url.query_pairs());
        if !from_query.is_empty() {
            return from_query;
        }
        url.fragment()
            .map(|fragment| Self::from_pairs(url::form_urlencoded::parse(fragment.as_bytes())))
            .unwrap_or_default()
    }

    fn from_pairs<'a>(
        pairs: impl Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
    ) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "code" => params.code = value,
                "state" => params.state = value,
                "error" => params.error = value,
                "error_description" => params.error_description = value,
                _ => {}
            }
        }
        params
    }

    /// Neither a code nor an error: not an authorization callback
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.error.is_none()
    }
}

/// Browser primitives the adapter needs
#[async_trait]
pub trait BrowserHost: Send + Sync {
    /// Navigate the top-level window; control normally leaves the application
    ///
    /// # Errors
    ///
    /// Returns an error if the navigation cannot be started
    async fn redirect(&self, url: &Url) -> Result<(), OidcError>;

    /// Load `url` in a hidden frame and return the parameters of the page it
    /// finally lands on
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be loaded or never returns
    async fn silent_check(&self, url: &Url) -> Result<CallbackParams, OidcError>;

    /// Callback parameters of the current page load, when the application was
    /// loaded as the login redirect target
    fn callback_params(&self) -> Option<CallbackParams>;

    /// Per-tab storage surviving the login redirect
    fn store(&self, key: &str, value: &str);

    /// Read and remove a stored value
    fn take(&self, key: &str) -> Option<String>;
}

// =============================================================================
// Endpoints
// =============================================================================

/// Realm endpoints derived from the provider base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeycloakEndpoints {
    pub auth: Url,
    pub token: Url,
    pub logout: Url,
}

impl KeycloakEndpoints {
    /// Build `{url}/realms/{realm}/protocol/openid-connect/*`
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::Configuration`] if the base URL does not parse
    pub fn new(base_url: &str, realm: &str) -> Result<Self, OidcError> {
        let base = format!(
            "{}/realms/{}/protocol/openid-connect",
            base_url.trim().trim_end_matches('/'),
            realm.trim()
        );
        let endpoint = |name: &str| {
            Url::parse(&format!("{base}/{name}")).map_err(|e| {
                OidcError::Configuration(format!("Invalid provider url {base_url}: {e}"))
            })
        };
        Ok(Self {
            auth: endpoint("auth")?,
            token: endpoint("token")?,
            logout: endpoint("logout")?,
        })
    }

    /// Authorization request URL for `request`
    #[must_use]
    pub fn authorization_url(
        &self,
        client_id: &str,
        scopes: &[String],
        request: &AuthorizationRequest,
    ) -> Url {
        let scope = if scopes.is_empty() {
            "openid".to_string()
        } else {
            scopes.join(" ")
        };
        let mut url = self.auth.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", client_id)
                .append_pair("redirect_uri", &request.redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", &scope)
                .append_pair("state", &request.state)
                .append_pair("nonce", &request.nonce)
                .append_pair("code_challenge", &request.pkce.challenge)
                .append_pair("code_challenge_method", CHALLENGE_METHOD);
            if let Some(prompt) = request.prompt {
                query.append_pair("prompt", prompt);
            }
        }
        url
    }

    #[must_use]
    pub fn logout_url(
        &self,
        client_id: &str,
        post_logout_redirect_uri: Option<&str>,
        id_token_hint: Option<&str>,
    ) -> Url {
        let mut url = self.logout.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", client_id);
            if let Some(uri) = post_logout_redirect_uri {
                query.append_pair("post_logout_redirect_uri", uri);
            }
            if let Some(hint) = id_token_hint {
                query.append_pair("id_token_hint", hint);
            }
        }
        url
    }
}

/// Values bound to one authorization request
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub redirect_uri: String,
    pub state: String,
    pub nonce: String,
    pub pkce: PkcePair,
    pub prompt: Option<&'static str>,
}

impl AuthorizationRequest {
    #[must_use]
    pub fn new(redirect_uri: String, prompt: Option<&'static str>) -> Self {
        Self {
            redirect_uri,
            state: pkce::random_token(16),
            nonce: pkce::random_token(16),
            pkce: PkcePair::generate(),
            prompt,
        }
    }

    fn save(&self, host: &dyn BrowserHost) {
        host.store(STATE_KEY, &self.state);
        host.store(NONCE_KEY, &self.nonce);
        host.store(VERIFIER_KEY, &self.pkce.verifier);
        host.store(REDIRECT_URI_KEY, &self.redirect_uri);
    }

    /// Restore the request saved before the login redirect; all values are
    /// consumed so a callback can only be completed once
    fn restore(host: &dyn BrowserHost) -> Option<Self> {
        let state = host.take(STATE_KEY);
        let nonce = host.take(NONCE_KEY);
        let verifier = host.take(VERIFIER_KEY);
        let redirect_uri = host.take(REDIRECT_URI_KEY);
        Some(Self {
            redirect_uri: redirect_uri?,
            state: state?,
            nonce: nonce?,
            pkce: PkcePair::from_verifier(verifier?),
            prompt: None,
        })
    }
}

// =============================================================================
// Token endpoint payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
    refresh_token: Option<String>,
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

/// Tokens held between calls
#[derive(Default)]
struct TokenSet {
    access_token: Option<String>,
    access_expires_at: Option<DateTime<Utc>>,
    refresh_token: Option<String>,
    id_token: Option<String>,
}

#[derive(Debug, Clone)]
struct ProviderState {
    settings: ProviderSettings,
    client_id: String,
    endpoints: KeycloakEndpoints,
}

impl ProviderState {
    fn from_settings(settings: &ProviderSettings) -> Result<Self, OidcError> {
        settings.validate().map_err(OidcError::Configuration)?;
        let client_id = settings
            .get_client_id()
            .ok_or_else(|| OidcError::Configuration("Missing client_id".to_string()))?;
        Url::parse(&settings.silent_check_sso_redirect_uri).map_err(|e| {
            OidcError::Configuration(format!("Invalid silent_check_sso_redirect_uri: {e}"))
        })?;
        Ok(Self {
            settings: settings.clone(),
            client_id,
            endpoints: KeycloakEndpoints::new(&settings.url, &settings.realm)?,
        })
    }

    /// Configured login redirect, else the application origin
    fn login_redirect_uri(&self) -> String {
        if let Some(uri) = &self.settings.login_redirect_uri {
            return uri.clone();
        }
        Url::parse(&self.settings.silent_check_sso_redirect_uri)
            .map(|silent| format!("{}/", silent.origin().ascii_serialization()))
            .unwrap_or_default()
    }
}

// =============================================================================
// Adapter
// =============================================================================

pub struct KeycloakClient {
    host: Arc<dyn BrowserHost>,
    http: reqwest::Client,
    provider: Mutex<Option<ProviderState>>,
    tokens: Mutex<TokenSet>,
}

impl KeycloakClient {
    #[must_use]
    pub fn new(host: Arc<dyn BrowserHost>) -> Self {
        Self::with_http_client(host, reqwest::Client::new())
    }

    #[must_use]
    pub fn with_http_client(host: Arc<dyn BrowserHost>, http: reqwest::Client) -> Self {
        Self {
            host,
            http,
            provider: Mutex::new(None),
            tokens: Mutex::new(TokenSet::default()),
        }
    }

    fn lock_provider(&self) -> MutexGuard<'_, Option<ProviderState>> {
        self.provider.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_tokens(&self) -> MutexGuard<'_, TokenSet> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_provider(&self) -> Result<ProviderState, OidcError> {
        self.lock_provider().clone().ok_or_else(|| {
            OidcError::Configuration("Keycloak adapter used before init_silent".to_string())
        })
    }

    /// Validate the callback against its request and redeem the code
    async fn finish_authorization(
        &self,
        provider: &ProviderState,
        request: &AuthorizationRequest,
        params: CallbackParams,
    ) -> Result<SilentInitResult, OidcError> {
        if params.state.as_deref() != Some(request.state.as_str()) {
            warn!("Authorization callback state does not match the request");
            return Err(OidcError::StateMismatch);
        }

        if let Some(error) = params.error {
            if NO_SESSION_ERRORS.contains(&error.as_str()) {
                debug!("Provider reports no session: {error}");
                return Ok(SilentInitResult::unauthenticated());
            }
            return Err(OidcError::Rejected {
                code: error,
                description: params.error_description,
            });
        }

        let code = params.code.ok_or_else(|| {
            OidcError::InvalidResponse("Authorization callback without code".to_string())
        })?;

        let tokens = self
            .token_request(
                &provider.endpoints.token,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code.as_str()),
                    ("client_id", provider.client_id.as_str()),
                    ("redirect_uri", request.redirect_uri.as_str()),
                    ("code_verifier", request.pkce.verifier.as_str()),
                ],
            )
            .await?;

        let claims = id_claims(tokens.id_token.as_deref(), Some(&request.nonce))?;
        let (access_token, expires_at) = self.store_tokens(tokens)?;
        info!("Authorization code redeemed, access token expires at {expires_at}");

        Ok(SilentInitResult {
            authenticated: true,
            access_token: Some(access_token),
            access_token_expiry: Some(expires_at),
            id_claims: claims,
        })
    }

    /// POST a form to the token endpoint
    ///
    /// 4xx answers carrying an OAuth error body become [`OidcError::Rejected`];
    /// anything else that is not a success is a transport-level failure.
    async fn token_request(
        &self,
        token_url: &Url,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, OidcError> {
        let response = self
            .http
            .post(token_url.clone())
            .form(form)
            .send()
            .await
            .map_err(|e| OidcError::Network(format!("Token request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return response.json::<TokenResponse>().await.map_err(|e| {
                OidcError::InvalidResponse(format!("Failed to parse token response: {e}"))
            });
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(err) if status.is_client_error() => Err(OidcError::Rejected {
                code: err.error,
                description: err.error_description,
            }),
            _ => Err(OidcError::Network(format!(
                "Token request failed with status: {status}"
            ))),
        }
    }

    /// Keep refresh and ID tokens from `tokens`; returns the access token and its expiry
    ///
    /// Nothing is stored when `expires_in` does not fit a timestamp.
    fn store_tokens(&self, tokens: TokenResponse) -> Result<(String, DateTime<Utc>), OidcError> {
        let expires_in = tokens.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECONDS);
        let expires_at = i64::try_from(expires_in)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                OidcError::InvalidResponse(format!("Token expires_in out of range: {expires_in}"))
            })?;

        let mut held = self.lock_tokens();
        held.access_token = Some(tokens.access_token.clone());
        held.access_expires_at = Some(expires_at);
        if tokens.refresh_token.is_some() {
            held.refresh_token = tokens.refresh_token;
        }
        if tokens.id_token.is_some() {
            held.id_token = tokens.id_token;
        }
        Ok((tokens.access_token, expires_at))
    }
}

/// Decode ID token claims, checking the nonce when one was sent
fn id_claims(id_token: Option<&str>, nonce: Option<&str>) -> Result<Option<Claims>, OidcError> {
    let Some(id_token) = id_token else {
        return Ok(None);
    };
    let claims = Claims::from_jwt(id_token)?;
    if let Some(expected) = nonce {
        if claims.get_str("nonce") != Some(expected) {
            return Err(OidcError::InvalidResponse(
                "ID token nonce does not match the request".to_string(),
            ));
        }
    }
    Ok(Some(claims))
}

#[async_trait]
impl OidcClient for KeycloakClient {
    async fn init_silent(&self, config: &ProviderSettings) -> Result<SilentInitResult, OidcError> {
        let provider = ProviderState::from_settings(config)?;
        *self.lock_provider() = Some(provider.clone());

        if let Some(params) = self.host.callback_params().filter(|p| !p.is_empty()) {
            debug!("Completing interactive login from redirect callback");
            let request =
                AuthorizationRequest::restore(self.host.as_ref()).ok_or(OidcError::StateMismatch)?;
            return self.finish_authorization(&provider, &request, params).await;
        }

        let request = AuthorizationRequest::new(
            provider.settings.silent_check_sso_redirect_uri.clone(),
            Some("none"),
        );
        let url = provider.endpoints.authorization_url(
            &provider.client_id,
            &provider.settings.scopes,
            &request,
        );
        debug!("Starting silent check-sso for realm {}", provider.settings.realm);
        let params = self.host.silent_check(&url).await?;
        self.finish_authorization(&provider, &request, params).await
    }

    async fn renew(&self, min_validity_seconds: u64) -> Result<RenewResult, OidcError> {
        let provider = self.current_provider()?;
        // A margin beyond the representable range is never satisfied
        let valid_until = i64::try_from(min_validity_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|min_validity| Utc::now().checked_add_signed(min_validity));

        let refresh_token = {
            let held = self.lock_tokens();
            let still_valid = held.access_token.is_some()
                && held
                    .access_expires_at
                    .zip(valid_until)
                    .is_some_and(|(expires_at, limit)| expires_at > limit);
            if still_valid {
                debug!("Access token valid for at least {min_validity_seconds}s, not refreshing");
                return Ok(RenewResult::default());
            }
            held.refresh_token.clone()
        };
        let refresh_token = refresh_token.ok_or_else(|| OidcError::Rejected {
            code: "invalid_grant".to_string(),
            description: Some("No refresh token held".to_string()),
        })?;

        let tokens = self
            .token_request(
                &provider.endpoints.token,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token.as_str()),
                    ("client_id", provider.client_id.as_str()),
                ],
            )
            .await?;

        let claims = id_claims(tokens.id_token.as_deref(), None)?;
        let (access_token, expires_at) = self.store_tokens(tokens)?;

        Ok(RenewResult {
            refreshed: true,
            access_token: Some(access_token),
            access_token_expiry: Some(expires_at),
            id_claims: claims,
        })
    }

    async fn interactive_login(&self) -> Result<(), OidcError> {
        let provider = self.current_provider()?;
        let request = AuthorizationRequest::new(provider.login_redirect_uri(), None);
        request.save(self.host.as_ref());
        let url = provider.endpoints.authorization_url(
            &provider.client_id,
            &provider.settings.scopes,
            &request,
        );
        self.host.redirect(&url).await
    }

    async fn interactive_logout(&self) -> Result<(), OidcError> {
        let provider = self.current_provider()?;
        let id_token = std::mem::take(&mut *self.lock_tokens()).id_token;
        let url = provider.endpoints.logout_url(
            &provider.client_id,
            provider.settings.post_logout_redirect_uri.as_deref(),
            id_token.as_deref(),
        );
        self.host.redirect(&url).await
    }
}
