#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the clima-auth library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod api_client;
pub mod oidc;
pub mod session;
pub mod settings;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use api_client::{ApiError, BearerClient};
pub use oidc::{Claims, KeycloakClient, OidcClient, OidcError};
pub use session::{SessionError, SessionLifecycleManager, SessionSnapshot, SessionStatus};
pub use settings::ClimaSettings;
