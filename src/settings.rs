use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound applied to `safety_margin_seconds`
pub const MAX_SAFETY_MARGIN_SECONDS: u64 = 86_400;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClimaSettings {
    pub provider: ProviderSettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
}

/// Identity-provider settings consumed by the OIDC adapter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderSettings {
    /// Provider base URL, e.g. `https://keycloak.example.com`
    pub url: String,
    /// Realm (tenant) identifier
    pub realm: String,

    // Direct value (can be overridden by the variable named in `client_id_env`)
    pub client_id: Option<String>,
    pub client_id_env: Option<String>,

    /// Same-origin page the hidden frame lands on during the silent check
    pub silent_check_sso_redirect_uri: String,
    /// Where the provider sends the browser after interactive login
    pub login_redirect_uri: Option<String>,
    /// Where the provider sends the browser after logout
    pub post_logout_redirect_uri: Option<String>,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionSettings {
    /// Minimum remaining lifetime an access token must have to be handed out.
    /// Renewal is scheduled this long before expiry.
    pub safety_margin_seconds: u64,
    /// Upper bound on a single renewal round trip
    pub renewal_timeout_seconds: u64,
    /// Upper bound on the silent check performed at startup
    pub init_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            realm: String::new(),
            client_id: None,
            client_id_env: None,
            silent_check_sso_redirect_uri: String::new(),
            login_redirect_uri: None,
            post_logout_redirect_uri: None,
            scopes: vec!["openid".to_string()],
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            safety_margin_seconds: 30,
            renewal_timeout_seconds: 10,
            init_timeout_seconds: 10,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ClimaSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Logger initialization fails
    /// - Settings file cannot be read or parsed
    pub fn load() -> Result<Self> {
        Self::load_env_file();

        let (mut settings, sources) = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);
        settings.logging.init()?;

        for source in &sources {
            log::info!("Loaded settings from {}", source.display());
        }
        Ok(settings)
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `CLIMA_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// Returns the files that were read, in order, so they can be logged once
    /// the logger is up.
    fn load_base_settings() -> Result<(Self, Vec<PathBuf>)> {
        let mut settings = Self::default();
        let mut sources = Vec::new();

        let default_config_path = Path::new("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_file(default_config_path)?;
            sources.push(default_config_path.to_path_buf());
        }

        if let Ok(secrets_dir) = std::env::var("CLIMA_SECRETS_DIR") {
            let secrets_path = Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_file(&secrets_path)?;
                sources.push(secrets_path);
            }
        }

        Ok((settings, sources))
    }

    /// Parse a single TOML settings file; missing sections fall back to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_file(path: &Path) -> Result<Self> {
        let toml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        basic_toml::from_str(&toml_content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_provider_env_overrides(&mut settings.provider);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    /// Apply environment overrides for provider settings
    pub fn apply_provider_env_overrides(provider: &mut ProviderSettings) {
        if let Ok(url) = std::env::var("KEYCLOAK_URL") {
            provider.url = url;
        }
        if let Ok(realm) = std::env::var("KEYCLOAK_REALM") {
            provider.realm = realm;
        }
        if let Ok(client_id) = std::env::var("KEYCLOAK_CLIENT_ID") {
            provider.client_id = Some(client_id);
        }
        if let Ok(uri) = std::env::var("SILENT_CHECK_SSO_REDIRECT_URI") {
            provider.silent_check_sso_redirect_uri = uri;
        }
        if let Ok(uri) = std::env::var("LOGIN_REDIRECT_URI") {
            provider.login_redirect_uri = Some(uri);
        }
        if let Ok(uri) = std::env::var("POST_LOGOUT_REDIRECT_URI") {
            provider.post_logout_redirect_uri = Some(uri);
        }
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session: &mut SessionSettings) {
        Self::apply_numeric_env_override(
            "SESSION_SAFETY_MARGIN_SECONDS",
            &mut session.safety_margin_seconds,
        );
        Self::apply_numeric_env_override(
            "SESSION_RENEWAL_TIMEOUT_SECONDS",
            &mut session.renewal_timeout_seconds,
        );
        Self::apply_numeric_env_override(
            "SESSION_INIT_TIMEOUT_SECONDS",
            &mut session.init_timeout_seconds,
        );
    }

    /// Helper function to apply numeric environment variable overrides
    fn apply_numeric_env_override(env_var: &str, target: &mut u64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<u64>() {
                *target = value;
            } else {
                log::warn!("Ignoring {env_var}={value_str}: not a non-negative integer");
            }
        }
    }

    /// Apply environment overrides for logging settings
    fn apply_logging_env_overrides(logging: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging.level = log_level;
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }
}

impl LoggingSettings {
    /// Install `env_logger` with `level` as its filter (`RUST_LOG` syntax)
    ///
    /// # Errors
    ///
    /// Returns an error if a logger has already been installed
    pub fn init(&self) -> Result<()> {
        env_logger::Builder::new()
            .parse_filters(&self.level)
            .try_init()
            .context("Failed to initialize logger")
    }
}

impl ProviderSettings {
    /// Get the client ID, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_client_id(&self) -> Option<String> {
        if let Some(env_var) = &self.client_id_env {
            if let Ok(value) = std::env::var(env_var) {
                return Some(value);
            }
        }
        self.client_id.clone()
    }

    /// Check that every value the provider needs is present
    ///
    /// Values are opaque here; only emptiness is checked. The adapter parses
    /// URLs when it is constructed.
    ///
    /// # Errors
    ///
    /// Returns a message naming every missing setting
    pub fn validate(&self) -> Result<(), String> {
        let client_id = self.get_client_id().unwrap_or_default();
        let missing: Vec<&str> = [
            ("url", self.url.as_str()),
            ("realm", self.realm.as_str()),
            ("client_id", client_id.as_str()),
            (
                "silent_check_sso_redirect_uri",
                self.silent_check_sso_redirect_uri.as_str(),
            ),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "missing identity provider settings: {}",
                missing.join(", ")
            ))
        }
    }
}

impl SessionSettings {
    /// Configured margin, clamped to [`MAX_SAFETY_MARGIN_SECONDS`]
    #[must_use]
    pub fn safety_margin_seconds(&self) -> u64 {
        self.safety_margin_seconds.min(MAX_SAFETY_MARGIN_SECONDS)
    }

    #[must_use]
    pub fn safety_margin(&self) -> chrono::Duration {
        i64::try_from(self.safety_margin_seconds())
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(chrono::Duration::zero)
    }

    #[must_use]
    pub fn renewal_timeout(&self) -> Duration {
        Duration::from_secs(self.renewal_timeout_seconds)
    }

    #[must_use]
    pub fn init_timeout(&self) -> Duration {
        Duration::from_secs(self.init_timeout_seconds)
    }
}
