//! Identity token claim decoding
//!
//! Claims are read from the payload segment of the identity token. Signature
//! verification is the provider adapter's concern; by the time a token reaches
//! this module it came straight from the provider's token endpoint over TLS.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::oidc::client::OidcError;

/// Decoded identity-token claims
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Wrap an already-decoded claim map
    #[must_use]
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Decode the payload of a compact JWT
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The token does not have three dot-separated segments
    /// - The payload is not base64url
    /// - The payload is not a JSON object
    pub fn from_jwt(token: &str) -> Result<Self, OidcError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(OidcError::InvalidResponse("Invalid JWT format".to_string()));
        }

        let payload_b64 = parts[1];
        let payload_bytes = general_purpose::URL_SAFE_NO_PAD
            .decode(payload_b64)
            .or_else(|_| general_purpose::URL_SAFE.decode(payload_b64))
            .map_err(|_| OidcError::InvalidResponse("Base64 decode failed".to_string()))?;

        match serde_json::from_slice::<Value>(&payload_bytes) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(_) => Err(OidcError::InvalidResponse(
                "JWT payload is not an object".to_string(),
            )),
            Err(_) => Err(OidcError::InvalidResponse("JSON parse failed".to_string())),
        }
    }

    /// Raw claim lookup
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String claim lookup; non-string values are ignored
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.get_str("sub")
    }

    #[must_use]
    pub fn preferred_username(&self) -> Option<&str> {
        self.get_str("preferred_username")
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.get_str("email")
    }

    /// Name to greet the user with: `preferred_username`, falling back to `name`
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.preferred_username()
            .filter(|s| !s.is_empty())
            .or_else(|| self.name().filter(|s| !s.is_empty()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Underlying claim map
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jwt_with_payload(payload: &Value) -> String {
        let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let body = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        format!("{header}.{body}.c2ln")
    }

    #[test]
    fn test_decode_keycloak_id_token() {
        let token = jwt_with_payload(&json!({
            "sub": "f3a1c2d4",
            "preferred_username": "jperez",
            "name": "Juan Perez",
            "email": "jperez@example.com",
            "email_verified": true,
            "exp": 1_900_000_000
        }));

        let claims = Claims::from_jwt(&token).unwrap();
        assert_eq!(claims.subject(), Some("f3a1c2d4"));
        assert_eq!(claims.preferred_username(), Some("jperez"));
        assert_eq!(claims.email(), Some("jperez@example.com"));
        assert_eq!(claims.get("email_verified"), Some(&json!(true)));
        assert_eq!(claims.get_str("exp"), None);
    }

    #[test]
    fn test_display_name_prefers_username() {
        let token = jwt_with_payload(&json!({"preferred_username": "jperez", "name": "Juan"}));
        assert_eq!(
            Claims::from_jwt(&token).unwrap().display_name(),
            Some("jperez")
        );

        let token = jwt_with_payload(&json!({"preferred_username": "", "name": "Juan"}));
        assert_eq!(
            Claims::from_jwt(&token).unwrap().display_name(),
            Some("Juan")
        );

        let token = jwt_with_payload(&json!({"sub": "x"}));
        assert_eq!(Claims::from_jwt(&token).unwrap().display_name(), None);
    }

    #[test]
    fn test_invalid_tokens_rejected() {
        assert!(Claims::from_jwt("not-a-jwt").is_err());
        assert!(Claims::from_jwt("a.!!!.c").is_err());

        let array_payload = general_purpose::URL_SAFE_NO_PAD.encode(b"[1,2,3]");
        assert!(Claims::from_jwt(&format!("h.{array_payload}.s")).is_err());
    }

    #[test]
    fn test_padded_payload_accepted() {
        let body = general_purpose::URL_SAFE.encode(br#"{"sub":"abc"}"#);
        assert!(body.ends_with('='));
        let claims = Claims::from_jwt(&format!("h.{body}.s")).unwrap();
        assert_eq!(claims.subject(), Some("abc"));
    }
}
