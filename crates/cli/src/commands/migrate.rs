//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! tw-cli migrate
//!
//! # Show which migrations are applied
//! tw-cli migrate --status
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string; falls back to
//!   `ADMIN_DATABASE_URL`. The role needs rights to create schemas.
//!
//! # Migration Files
//!
//! One set of migrations in `migrations/` at the workspace root creates the
//! `shop`, `admin` and `tower_sessions` schemas. They are embedded at
//! compile time and never run by the servers on startup.

use std::collections::HashSet;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::{Migrate, Migrator};
use thiserror::Error;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

async fn connect() -> Result<PgPool, MigrationError> {
    let database_url = super::database_url("ADMIN_DATABASE_URL")
        .ok_or(MigrationError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(PgPool::connect(database_url.expose_secret()).await?)
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!(embedded = MIGRATOR.iter().count(), "Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

/// Log each embedded migration and whether it has been applied.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn status() -> Result<(), MigrationError> {
    let pool = connect().await?;
    let mut conn = pool.acquire().await?;

    conn.ensure_migrations_table().await?;
    let applied: HashSet<i64> = conn
        .list_applied_migrations()
        .await?
        .into_iter()
        .map(|m| m.version)
        .collect();

    let mut pending = 0;
    for migration in MIGRATOR.iter() {
        let state = if applied.contains(&migration.version) {
            "applied"
        } else {
            pending += 1;
            "pending"
        };
        tracing::info!("  {} {} [{state}]", migration.version, migration.description);
    }

    tracing::info!(pending, "Migration status");
    Ok(())
}
