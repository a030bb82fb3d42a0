//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! hexshop migrate
//! ```
//!
//! Applies every pending migration embedded from `crates/api/migrations/`,
//! including the session table used by the API server.

use hexshop_api::db::MIGRATOR;

use super::{CommandError, connect};

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!(available = MIGRATOR.iter().count(), "Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
