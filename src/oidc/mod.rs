//! OpenID Connect plumbing
//!
//! - [`client`] - Adapter contract consumed by the session manager
//! - [`claims`] - Identity token claims
//! - [`pkce`] - PKCE S256 and random request values
//! - [`keycloak`] - Keycloak adapter over a browser host

pub mod claims;
pub mod client;
pub mod keycloak;
pub mod pkce;

pub use claims::Claims;
pub use client::{OidcClient, OidcError, RenewResult, SilentInitResult};
pub use keycloak::{
    AuthorizationRequest, BrowserHost, CallbackParams, KeycloakClient, KeycloakEndpoints,
};
pub use pkce::PkcePair;
