//! Session middleware configuration.
//!
//! Sessions live in `PostgreSQL` (`dashboard.session`) and expire after
//! 12 hours of inactivity.

use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::DashboardConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "urbannue_session";

/// Session expiry time in seconds (12 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 12 * 60 * 60;

/// The session store rejected the configured schema or table name.
#[derive(Debug, Error)]
#[error("invalid session store name: {0}")]
pub struct SessionLayerError(String);

/// Apply the dashboard's cookie settings to any session store.
///
/// `SameSite=Lax`: the Shopify OAuth callback is a cross-site top-level
/// navigation and must still carry the cookie.
#[must_use]
pub fn session_layer<S>(store: S, secure: bool) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Create the session layer backed by `PostgreSQL`.
///
/// The table is created by the `dashboard` migrations, not by the store.
///
/// # Errors
///
/// Returns `SessionLayerError` if the store rejects the schema or table name.
pub fn create_session_layer(
    pool: &PgPool,
    config: &DashboardConfig,
) -> Result<SessionManagerLayer<PostgresStore>, SessionLayerError> {
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("dashboard")
        .map_err(|e| SessionLayerError(e.to_string()))?
        .with_table_name("session")
        .map_err(|e| SessionLayerError(e.to_string()))?;

    Ok(session_layer(store, config.is_secure()))
}
