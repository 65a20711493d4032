//! Database migration command.
//!
//! Migrations are embedded from `crates/dashboard/migrations/` at compile
//! time.

use super::{CommandError, connect};

/// Run the dashboard migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running dashboard migrations...");
    sqlx::migrate!("../dashboard/migrations").run(&pool).await?;

    tracing::info!("Dashboard migrations complete!");
    Ok(())
}
