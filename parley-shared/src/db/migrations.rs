/// Database migration runner
///
/// Migrations live in `migrations/` at the workspace root as reversible
/// `.up.sql` / `.down.sql` pairs and are embedded at compile time.
use sqlx::PgPool;
use tracing::info;

/// Runs all pending migrations
///
/// # Errors
///
/// Returns an error if a migration fails to apply; the failing migration is
/// rolled back.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");
    sqlx::migrate!("../migrations").run(pool).await?;
    info!("Database schema is up to date");
    Ok(())
}
