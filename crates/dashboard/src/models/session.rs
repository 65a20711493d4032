//! Session-stored state for the password gate and the OAuth round trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use urbannue_core::ShopDomain;

/// Proof that this browser entered the access password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessGrant {
    /// When the password was accepted.
    pub granted_at: DateTime<Utc>,
}

impl AccessGrant {
    /// A grant issued now.
    #[must_use]
    pub fn now() -> Self {
        Self {
            granted_at: Utc::now(),
        }
    }
}

/// OAuth install started from this browser and not yet completed.
///
/// The callback must come back with the same `state` for the same shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOAuth {
    /// CSRF nonce sent as the `state` parameter.
    pub state: String,
    /// Store the install was started for.
    pub shop: ShopDomain,
}

/// Session keys.
pub mod keys {
    /// [`AccessGrant`](super::AccessGrant) set by a successful login.
    pub const ACCESS: &str = "access";

    /// Store currently shown on the dashboard.
    pub const CONNECTED_SHOP: &str = "connected_shop";

    /// [`PendingOAuth`](super::PendingOAuth) between connect and callback.
    pub const PENDING_OAUTH: &str = "pending_oauth";
}
