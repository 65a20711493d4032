//! Types stored in the browser session.

pub mod session;

pub use session::{AccessGrant, PendingOAuth, keys as session_keys};
