//! Versioned schema migrations
//!
//! Each migration runs once, tracked in `schema_version`, and is written to
//! be safe on databases created by older tooling as well as fresh ones.
//!
//! Never modify an existing migration; add a new one and bump
//! [`CURRENT_SCHEMA_VERSION`].

use crate::db::schema_sync::table_exists;
use crate::db::table_schemas::relevance_column;
use crate::platform::Platform;
use crate::relevance::{RelevanceCode, LEGACY_ABSENT_CODE};
use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
const CURRENT_SCHEMA_VERSION: i64 = 2;

/// Latest applied version, 0 when none
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i64> {
    if !table_exists(pool, "schema_version").await? {
        return Ok(0);
    }

    let version: Option<i64> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("Migration v2 completed");
    }

    Ok(())
}

/// Migration v1: rewrite the legacy `-1` absent sentinel to `4`
///
/// The three-code ledger stored `-1` for platforms the host never used.
/// Only the four-code enumeration is read or written now.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    if !table_exists(pool, "labeled_hosts").await? {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    let mut rewritten = 0;

    for platform in Platform::ALL {
        // Column name from a fixed list, values bound
        let sql = format!(
            "UPDATE labeled_hosts SET {col} = ? WHERE {col} = ?",
            col = relevance_column(platform)
        );
        let result = sqlx::query(&sql)
            .bind(RelevanceCode::NotPresent.as_i64())
            .bind(LEGACY_ABSENT_CODE)
            .execute(&mut *tx)
            .await?;
        rewritten += result.rows_affected();
    }

    tx.commit().await?;

    if rewritten > 0 {
        info!("  Rewrote {} legacy absent codes to {}", rewritten, RelevanceCode::NotPresent.as_i64());
    }
    Ok(())
}

/// Migration v2: one ledger row per host
///
/// Ledgers created without a primary key get a unique index on `hostname`.
/// If duplicate rows already exist the index cannot be built; the ledger's
/// own existence check still prevents new duplicates.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    if !table_exists(pool, "labeled_hosts").await? {
        return Ok(());
    }

    match sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_labeled_hosts_hostname ON labeled_hosts(hostname)")
        .execute(pool)
        .await
    {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() || db_err.message().contains("UNIQUE") => {
            let duplicates: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM (SELECT hostname FROM labeled_hosts GROUP BY hostname HAVING COUNT(*) > 1)",
            )
            .fetch_one(pool)
            .await?;
            warn!(
                "  labeled_hosts contains {} hosts labeled more than once; unique index not created",
                duplicates
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
