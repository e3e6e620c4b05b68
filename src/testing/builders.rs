//! Fluent builders for creating customizable test objects

use base64::{engine::general_purpose, Engine as _};
use serde_json::{Map, Value};

use super::constants::{TEST_EMAIL, TEST_SUBJECT, TEST_USERNAME, TEST_USER_NAME};

/// Builder for unsigned ID tokens (`header.payload.signature`)
///
/// Only the payload matters to the code under test; the signature segment is
/// a fixed placeholder.
pub struct TestIdTokenBuilder {
    claims: Map<String, Value>,
}

impl TestIdTokenBuilder {
    /// Token for the default test user
    #[must_use]
    pub fn new() -> Self {
        Self::empty()
            .with_claim("sub", TEST_SUBJECT)
            .with_claim("preferred_username", TEST_USERNAME)
            .with_claim("name", TEST_USER_NAME)
            .with_claim("email", TEST_EMAIL)
    }

    /// Token with no claims at all
    #[must_use]
    pub fn empty() -> Self {
        Self { claims: Map::new() }
    }

    #[must_use]
    pub fn with_claim(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.claims.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn without_claim(mut self, key: &str) -> Self {
        self.claims.remove(key);
        self
    }

    #[must_use]
    pub fn with_nonce(self, nonce: &str) -> Self {
        self.with_claim("nonce", nonce)
    }

    #[must_use]
    pub fn build(&self) -> String {
        let header = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload =
            general_purpose::URL_SAFE_NO_PAD.encode(Value::Object(self.claims.clone()).to_string());
        format!("{header}.{payload}.test-signature")
    }

    /// The claims map as the session would store it
    #[must_use]
    pub fn claims(&self) -> crate::oidc::Claims {
        crate::oidc::Claims::from(self.claims.clone())
    }
}

impl Default for TestIdTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
