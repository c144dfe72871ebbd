//! Embedded schema migrations.
//!
//! The SQL files in `migrations/sqlite/` at the workspace root are compiled
//! into the binary. Applied versions are tracked by sqlx in
//! `_sqlx_migrations`, so applying again on a current database is a no-op.
//!
//! New schema changes go in a new `NNN_description.sql` file; applied files
//! are never edited.

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every pending migration and returns how many ran.
pub async fn apply(pool: &SqlitePool) -> DbResult<usize> {
    let pending = pending_versions(pool).await?;
    if pending.is_empty() {
        debug!("Schema is current");
        return Ok(0);
    }

    MIGRATOR.run(pool).await?;

    info!(count = pending.len(), versions = ?pending, "Applied migrations");
    Ok(pending.len())
}

/// Versions recorded as successfully applied, oldest first.
pub async fn applied_versions(pool: &SqlitePool) -> DbResult<Vec<i64>> {
    let tracked: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;

    if !tracked {
        return Ok(Vec::new());
    }

    let versions =
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success = 1 ORDER BY version")
            .fetch_all(pool)
            .await?;

    Ok(versions)
}

/// Embedded versions not yet applied to this database.
pub async fn pending_versions(pool: &SqlitePool) -> DbResult<Vec<i64>> {
    let applied = applied_versions(pool).await?;

    Ok(MIGRATOR
        .iter()
        .map(|migration| migration.version)
        .filter(|version| !applied.contains(version))
        .collect())
}
