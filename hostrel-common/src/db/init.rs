//! Database initialization
//!
//! Opens (or creates) the SQLite store and brings the four tables this
//! workspace uses up to the current schema. Safe to run on every start.

use crate::{Error, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open the database at `db_path`, creating it if needed
///
/// Connection failures are reported as [`Error::StoreUnavailable`].
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect(&db_url)
        .await
        .map_err(|e| Error::StoreUnavailable(format!("{}: {}", db_path.display(), e)))?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    prepare_schema(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory database with the full schema
///
/// One connection only: every SQLite `:memory:` connection is a separate
/// database.
pub async fn open_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    prepare_schema(&pool).await?;
    Ok(pool)
}

/// Create tables, sync columns, run migrations
pub async fn prepare_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_schema_version_table(pool).await?;
    create_hosts_table(pool).await?;
    create_found_videos_table(pool).await?;
    create_host_features_table(pool).await?;
    create_labeled_hosts_table(pool).await?;

    crate::db::table_schemas::sync_all_table_schemas(pool).await?;
    crate::db::migrations::run_migrations(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Hosts observed by the crawler
pub async fn create_hosts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS hosts (
            hostname TEXT PRIMARY KEY,
            article_count INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (article_count >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Video occurrences: one row per (article, video) embedding
pub async fn create_found_videos_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS found_videos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            hostname TEXT NOT NULL,
            website_url TEXT NOT NULL,
            platform TEXT NOT NULL,
            video_url TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_found_videos_hostname ON found_videos(hostname)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Per-host feature record
pub async fn create_host_features_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS host_features (
            hostname TEXT PRIMARY KEY,
            article_count INTEGER NOT NULL DEFAULT 0,
            twitter_std_dev REAL NOT NULL DEFAULT -1.0,
            twitter_count INTEGER NOT NULL DEFAULT 0,
            twitter_sum INTEGER NOT NULL DEFAULT 0,
            twitter_sum_distinct INTEGER NOT NULL DEFAULT 0,
            facebook_std_dev REAL NOT NULL DEFAULT -1.0,
            facebook_count INTEGER NOT NULL DEFAULT 0,
            facebook_sum INTEGER NOT NULL DEFAULT 0,
            facebook_sum_distinct INTEGER NOT NULL DEFAULT 0,
            youtube_std_dev REAL NOT NULL DEFAULT -1.0,
            youtube_count INTEGER NOT NULL DEFAULT 0,
            youtube_sum INTEGER NOT NULL DEFAULT 0,
            youtube_sum_distinct INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Labeling ledger: existence of a row marks the host as judged
pub async fn create_labeled_hosts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS labeled_hosts (
            hostname TEXT PRIMARY KEY,
            twitter_relevant INTEGER NOT NULL CHECK (twitter_relevant BETWEEN 1 AND 4),
            facebook_relevant INTEGER NOT NULL CHECK (facebook_relevant BETWEEN 1 AND 4),
            youtube_relevant INTEGER NOT NULL CHECK (youtube_relevant BETWEEN 1 AND 4),
            labeled_at TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
