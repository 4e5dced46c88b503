//! Database migration management.

use sqlx::{Pool, Sqlite};

use crate::error_handling::DatabaseError;

/// Migrations from the `migrations/` directory, embedded at compile time so the
/// binary does not depend on the source tree at runtime.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Applies all pending schema migrations.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), DatabaseError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}
