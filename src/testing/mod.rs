//! Testing utilities for clima-auth
//!
//! Shared by unit tests and by the integration tests under `tests/` (which
//! enable the `testing` feature).
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built settings, results and managers
//! - [`builders`] - Fluent builder for unsigned ID tokens
//! - [`mock`] - Scripted OIDC adapter and fake browser host
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clima_auth::testing::{fixtures::TestFixtures, mock::MockOidcClient};
//! use std::sync::Arc;
//!
//! let client = Arc::new(
//!     MockOidcClient::new().with_init(Ok(TestFixtures::silent_authenticated("T", 3600))),
//! );
//! let manager = TestFixtures::manager(client.clone());
//! assert_eq!(client.init_calls(), 0);
//! ```

pub mod builders;
pub mod fixtures;
pub mod mock;

// Re-export commonly used items for convenience
pub use builders::TestIdTokenBuilder;
pub use fixtures::TestFixtures;
pub use mock::{FakeBrowserHost, InitBehavior, MockOidcClient, RenewBehavior};

/// Common test constants
pub mod constants {
    pub const TEST_PROVIDER_URL: &str = "https://keycloak.example.com";
    pub const TEST_REALM: &str = "myrealm";
    pub const TEST_CLIENT_ID: &str = "nextjs-client";
    pub const TEST_SILENT_CHECK_URI: &str = "https://clima.example.com/silent-check-sso.html";
    pub const TEST_APP_ORIGIN: &str = "https://clima.example.com/";

    pub const TEST_SUBJECT: &str = "f5b1c2d3-0000-4000-8000-000000000001";
    pub const TEST_USERNAME: &str = "jdoe";
    pub const TEST_USER_NAME: &str = "Jane Doe";
    pub const TEST_EMAIL: &str = "jdoe@example.com";
}
