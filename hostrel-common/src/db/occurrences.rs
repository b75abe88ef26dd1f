//! Reads of crawler-produced records: hosts and video occurrences
//!
//! The crawler owns these tables. The insert helpers exist for fixtures and
//! for importing crawler output; nothing in the pipelines writes here.

use crate::platform::Platform;
use crate::Result;
use sqlx::{Row, SqlitePool};
use tracing::warn;

/// One embedded video found in one article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub article_url: String,
    pub platform: Platform,
    pub video_url: String,
}

impl Occurrence {
    pub fn new(article_url: impl Into<String>, platform: Platform, video_url: impl Into<String>) -> Self {
        Self {
            article_url: article_url.into(),
            platform,
            video_url: video_url.into(),
        }
    }
}

/// All occurrences recorded for a host, in insertion order
///
/// Rows naming an untracked platform are skipped with a warning.
pub async fn fetch_occurrences(pool: &SqlitePool, hostname: &str) -> Result<Vec<Occurrence>> {
    let rows = sqlx::query(
        r#"
        SELECT website_url, platform, video_url
        FROM found_videos
        WHERE hostname = ?
        ORDER BY id
        "#,
    )
    .bind(hostname)
    .fetch_all(pool)
    .await?;

    let mut occurrences = Vec::with_capacity(rows.len());
    for row in rows {
        let platform_name: String = row.get("platform");
        match platform_name.parse::<Platform>() {
            Ok(platform) => occurrences.push(Occurrence {
                article_url: row.get("website_url"),
                platform,
                video_url: row.get("video_url"),
            }),
            Err(_) => warn!(
                "Skipping occurrence on {} with untracked platform '{}'",
                hostname, platform_name
            ),
        }
    }

    Ok(occurrences)
}

/// Total article count for a host, including articles without video
///
/// Unknown hosts count zero articles.
pub async fn fetch_article_count(pool: &SqlitePool, hostname: &str) -> Result<u64> {
    let count: Option<i64> = sqlx::query_scalar("SELECT article_count FROM hosts WHERE hostname = ?")
        .bind(hostname)
        .fetch_optional(pool)
        .await?;

    Ok(count.unwrap_or(0).max(0) as u64)
}

pub async fn host_exists(pool: &SqlitePool, hostname: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM hosts WHERE hostname = ?)")
        .bind(hostname)
        .fetch_one(pool)
        .await?;

    Ok(exists)
}

/// Every known hostname, alphabetically
pub async fn list_hostnames(pool: &SqlitePool) -> Result<Vec<String>> {
    let hosts: Vec<String> = sqlx::query_scalar("SELECT hostname FROM hosts ORDER BY hostname")
        .fetch_all(pool)
        .await?;

    Ok(hosts)
}

/// Register a host (or update its article count)
pub async fn upsert_host(pool: &SqlitePool, hostname: &str, article_count: u64) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO hosts (hostname, article_count) VALUES (?, ?)
        ON CONFLICT(hostname) DO UPDATE SET article_count = excluded.article_count
        "#,
    )
    .bind(hostname)
    .bind(article_count as i64)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record one occurrence
pub async fn insert_occurrence(pool: &SqlitePool, hostname: &str, occurrence: &Occurrence) -> Result<()> {
    sqlx::query("INSERT INTO found_videos (hostname, website_url, platform, video_url) VALUES (?, ?, ?, ?)")
        .bind(hostname)
        .bind(&occurrence.article_url)
        .bind(occurrence.platform.as_str())
        .bind(&occurrence.video_url)
        .execute(pool)
        .await?;

    Ok(())
}
