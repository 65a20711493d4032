//! HTTP middleware for the dashboard.
//!
//! - [`session`] builds the `tower-sessions` layer
//! - [`auth`] provides the password-gate extractor and its helpers

pub mod auth;
pub mod session;

pub use auth::{AccessRejection, RequireAccess, grant_access, password_matches, revoke_access};
pub use session::{SESSION_COOKIE_NAME, SessionLayerError, create_session_layer, session_layer};
