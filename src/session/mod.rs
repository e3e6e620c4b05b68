//! Session Lifecycle Module
//!
//! Owns the authentication state of the dashboard and keeps its access token
//! fresh.
//!
//! # Modules
//!
//! - [`manager`] - `SessionLifecycleManager`, the public API
//! - [`state`] - Session model, access grant and renewal outcome types
//! - [`scheduler`] - Cancellable proactive renewal timer
//! - [`error`] - Session error taxonomy

pub mod error;
pub mod manager;
pub mod scheduler;
pub mod state;

// Re-export commonly used items for convenience
pub use error::{RenewalFailure, SessionError};
pub use manager::SessionLifecycleManager;
pub use scheduler::RenewalTrigger;
pub use state::{AccessGrant, RenewalAttempt, SessionSnapshot, SessionStatus};
