//! Feature record persistence
//!
//! A record is computed completely from a [`HostAggregate`] before anything
//! is written, then stored with a single parameterized upsert inside its own
//! transaction. Every feature column is overwritten; earlier values never
//! influence the result.

use std::sync::OnceLock;

use hostrel_common::db::FEATURE_COLUMNS;
use hostrel_common::{HostAggregate, Platform, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

/// Four features of one platform
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlatformFeatures {
    pub std_dev: f64,
    pub count: u64,
    pub sum: u64,
    pub sum_distinct: u64,
}

/// One row of `host_features`
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub hostname: String,
    pub article_count: u64,
    platforms: [PlatformFeatures; 3],
}

impl FeatureRecord {
    pub fn from_aggregate(aggregate: &HostAggregate) -> Self {
        let platforms = Platform::ALL.map(|platform| {
            let stats = aggregate.stats(platform);
            PlatformFeatures {
                std_dev: stats.std_dev,
                count: stats.count,
                sum: stats.sum,
                sum_distinct: stats.sum_distinct,
            }
        });

        Self {
            hostname: aggregate.hostname.clone(),
            article_count: aggregate.article_count,
            platforms,
        }
    }

    pub fn platform(&self, platform: Platform) -> &PlatformFeatures {
        &self.platforms[platform.index()]
    }
}

/// Upsert statement over the fixed column list
fn upsert_sql() -> &'static str {
    static SQL: OnceLock<String> = OnceLock::new();
    SQL.get_or_init(|| {
        let columns = FEATURE_COLUMNS.join(", ");
        let placeholders = vec!["?"; FEATURE_COLUMNS.len()].join(", ");
        let updates = FEATURE_COLUMNS
            .iter()
            .map(|c| format!("{c} = excluded.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO host_features (hostname, article_count, {columns}) \
             VALUES (?, ?, {placeholders}) \
             ON CONFLICT(hostname) DO UPDATE SET article_count = excluded.article_count, {updates}"
        )
    })
}

/// Store a feature record, replacing any previous one for the host
pub async fn write_features(pool: &SqlitePool, record: &FeatureRecord) -> Result<()> {
    let mut query = sqlx::query(upsert_sql())
        .bind(&record.hostname)
        .bind(record.article_count as i64);

    // Bind order follows FEATURE_COLUMNS: std_dev, count, sum, sum_distinct per platform
    for platform in Platform::ALL {
        let f = record.platform(platform);
        query = query
            .bind(f.std_dev)
            .bind(f.count as i64)
            .bind(f.sum as i64)
            .bind(f.sum_distinct as i64);
    }

    let mut tx = pool.begin().await?;
    query.execute(&mut *tx).await?;
    tx.commit().await?;

    debug!("Stored features for {}", record.hostname);
    Ok(())
}

/// Read back a host's feature record
pub async fn load_features(pool: &SqlitePool, hostname: &str) -> Result<Option<FeatureRecord>> {
    let sql = format!(
        "SELECT article_count, {} FROM host_features WHERE hostname = ?",
        FEATURE_COLUMNS.join(", ")
    );
    let row = sqlx::query(&sql).bind(hostname).fetch_optional(pool).await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut platforms = [PlatformFeatures::default(); 3];
    for platform in Platform::ALL {
        platforms[platform.index()] = read_platform(&row, platform)?;
    }

    Ok(Some(FeatureRecord {
        hostname: hostname.to_string(),
        article_count: row.try_get::<i64, _>("article_count")?.max(0) as u64,
        platforms,
    }))
}

fn read_platform(row: &SqliteRow, platform: Platform) -> Result<PlatformFeatures> {
    let base = platform.index() * 4;
    Ok(PlatformFeatures {
        std_dev: row.try_get::<f64, _>(FEATURE_COLUMNS[base])?,
        count: row.try_get::<i64, _>(FEATURE_COLUMNS[base + 1])?.max(0) as u64,
        sum: row.try_get::<i64, _>(FEATURE_COLUMNS[base + 2])?.max(0) as u64,
        sum_distinct: row.try_get::<i64, _>(FEATURE_COLUMNS[base + 3])?.max(0) as u64,
    })
}
