//! Database operations for the dashboard `PostgreSQL` schema.
//!
//! ## Tables (schema `dashboard`)
//!
//! - `shop_session` - One Admin API access token per connected store
//! - `session` - Browser sessions (managed by `tower-sessions`)
//!
//! # Migrations
//!
//! Migrations live in `crates/dashboard/migrations/` and run via:
//! ```bash
//! cargo run -p urbannue-cli -- migrate
//! ```

pub mod shop_sessions;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use shop_sessions::{ShopSession, ShopSessionRepository, ShopSessionSummary};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
