//! PKCE (RFC 7636) and request-binding values for the authorization request

use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Only S256 is ever sent; `plain` is not offered
pub const CHALLENGE_METHOD: &str = "S256";

/// Verifier/challenge pair for one authorization request
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    /// Generate a fresh verifier (32 random bytes, base64url) and its S256 challenge
    #[must_use]
    pub fn generate() -> Self {
        Self::from_verifier(random_token(32))
    }

    /// Derive the S256 challenge for an existing verifier
    #[must_use]
    pub fn from_verifier(verifier: String) -> Self {
        let challenge = s256_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// `BASE64URL(SHA256(ASCII(verifier)))`
#[must_use]
pub fn s256_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    general_purpose::URL_SAFE_NO_PAD.encode(digest)
}

/// Random base64url string from `bytes` bytes of entropy, used for `state`
/// and `nonce` as well as the verifier
#[must_use]
pub fn random_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::rng().fill_bytes(&mut buf);
    general_purpose::URL_SAFE_NO_PAD.encode(buf)
}
