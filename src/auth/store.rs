//! SQLite pool setup and schema bootstrap.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/db/schema.sql"));

// Bound on store access so a locked database cannot stall a login decision.
const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the database behind `dsn` and ensure the schema exists.
///
/// # Errors
/// Returns an error when the DSN is invalid or the database is unreachable.
pub async fn connect(dsn: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(dsn)
        .with_context(|| format!("Invalid database DSN: {dsn}"))?
        .create_if_missing(true)
        // WAL keeps concurrent attempt writes from blocking windowed reads.
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(STORE_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(STORE_TIMEOUT)
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    ensure_schema(&pool).await?;

    Ok(pool)
}

/// Create the credential and attempt tables when missing. Idempotent.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await
        .context("Failed to apply database schema")?;

    debug!("Database schema ready");

    Ok(())
}

/// Single-connection in-memory pool; shared state requires one connection.
#[cfg(test)]
pub(crate) async fn memory_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new().filename(":memory:");

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .context("Failed to open in-memory database")?;

    ensure_schema(&pool).await?;

    Ok(pool)
}
