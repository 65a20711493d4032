//! CLI command implementations.

pub mod migrate;
pub mod shops;

use secrecy::SecretString;
use sqlx::PgPool;
use urbannue_dashboard::config::{ConfigError, get_database_url};

/// Connect to the dashboard database.
///
/// Reads `DASHBOARD_DATABASE_URL`, falling back to `DATABASE_URL`.
async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url: SecretString = get_database_url("DASHBOARD_DATABASE_URL")?;

    tracing::info!("Connecting to dashboard database...");
    Ok(urbannue_dashboard::db::create_pool(&database_url).await?)
}

/// Errors shared by the commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] urbannue_dashboard::db::RepositoryError),

    #[error("Invalid shop: {0}")]
    InvalidShop(#[from] urbannue_core::ShopDomainError),
}
