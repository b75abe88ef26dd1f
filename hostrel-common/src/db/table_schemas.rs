//! Table schema declarations
//!
//! Single source of truth for the columns this workspace reads and writes.
//! The feature column names defined here are the only identifiers ever
//! placed into SQL text; all values are bound parameters.

use crate::db::schema_sync::{sync_table, ColumnDefinition, TableSchema};
use crate::platform::Platform;
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Feature column names, four per platform in [`Platform::ALL`] order:
/// `std_dev`, `count`, `sum`, `sum_distinct`
pub const FEATURE_COLUMNS: [&str; 12] = [
    "twitter_std_dev",
    "twitter_count",
    "twitter_sum",
    "twitter_sum_distinct",
    "facebook_std_dev",
    "facebook_count",
    "facebook_sum",
    "facebook_sum_distinct",
    "youtube_std_dev",
    "youtube_count",
    "youtube_sum",
    "youtube_sum_distinct",
];

/// Relevance column in `labeled_hosts` for a platform
pub fn relevance_column(platform: Platform) -> &'static str {
    match platform {
        Platform::Twitter => "twitter_relevant",
        Platform::Facebook => "facebook_relevant",
        Platform::Youtube => "youtube_relevant",
    }
}

/// `hosts`: written by the crawler, read here
pub struct HostsTableSchema;

impl TableSchema for HostsTableSchema {
    fn table_name() -> &'static str {
        "hosts"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("hostname", "TEXT").primary_key(),
            // Articles crawled for the host, including those without video
            ColumnDefinition::new("article_count", "INTEGER").not_null().default("0"),
        ]
    }
}

/// `host_features`: one feature record per host
pub struct HostFeaturesTableSchema;

impl TableSchema for HostFeaturesTableSchema {
    fn table_name() -> &'static str {
        "host_features"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        let mut columns = vec![
            ColumnDefinition::new("hostname", "TEXT").primary_key(),
            ColumnDefinition::new("article_count", "INTEGER").not_null().default("0"),
        ];

        for name in FEATURE_COLUMNS {
            let column = if name.ends_with("_std_dev") {
                ColumnDefinition::new(name, "REAL").not_null().default("-1.0")
            } else {
                ColumnDefinition::new(name, "INTEGER").not_null().default("0")
            };
            columns.push(column);
        }
        columns
    }
}

/// `labeled_hosts`: the labeling ledger
pub struct LabeledHostsTableSchema;

impl TableSchema for LabeledHostsTableSchema {
    fn table_name() -> &'static str {
        "labeled_hosts"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        let mut columns = vec![ColumnDefinition::new("hostname", "TEXT").primary_key()];
        for platform in Platform::ALL {
            columns.push(ColumnDefinition::new(relevance_column(platform), "INTEGER").not_null());
        }
        // Older ledgers predate this column
        columns.push(ColumnDefinition::new("labeled_at", "TIMESTAMP"));
        columns
    }
}

/// Synchronize all table schemas
pub async fn sync_all_table_schemas(pool: &SqlitePool) -> Result<()> {
    sync_table::<HostsTableSchema>(pool).await?;
    sync_table::<HostFeaturesTableSchema>(pool).await?;
    sync_table::<LabeledHostsTableSchema>(pool).await?;

    info!("Schema synchronization complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema_sync::introspect_table;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[test]
    fn test_feature_columns_follow_platform_order() {
        for platform in Platform::ALL {
            let base = platform.index() * 4;
            assert_eq!(FEATURE_COLUMNS[base], format!("{}_std_dev", platform));
            assert_eq!(FEATURE_COLUMNS[base + 1], format!("{}_count", platform));
            assert_eq!(FEATURE_COLUMNS[base + 2], format!("{}_sum", platform));
            assert_eq!(FEATURE_COLUMNS[base + 3], format!("{}_sum_distinct", platform));
        }
    }

    #[tokio::test]
    async fn test_sync_adds_missing_feature_columns() {
        let pool = setup_test_db().await;

        // Older feature table with only one platform's dispersion
        sqlx::query(
            "CREATE TABLE host_features (hostname TEXT PRIMARY KEY, article_count INTEGER, youtube_std_dev REAL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO host_features (hostname, article_count, youtube_std_dev) VALUES ('old.example', 3, 0.5)")
            .execute(&pool)
            .await
            .unwrap();

        sync_table::<HostFeaturesTableSchema>(&pool).await.unwrap();

        let columns = introspect_table(&pool, "host_features").await.unwrap();
        for name in FEATURE_COLUMNS {
            assert!(columns.iter().any(|c| c.name == name), "missing {}", name);
        }

        // Existing row keeps its value, new columns carry their defaults
        let (std_dev, twitter_std_dev, twitter_sum): (f64, f64, i64) = sqlx::query_as(
            "SELECT youtube_std_dev, twitter_std_dev, twitter_sum FROM host_features WHERE hostname = 'old.example'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(std_dev, 0.5);
        assert_eq!(twitter_std_dev, -1.0);
        assert_eq!(twitter_sum, 0);
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let pool = setup_test_db().await;
        sqlx::query("CREATE TABLE labeled_hosts (hostname TEXT, youtube_relevant INTEGER, twitter_relevant INTEGER, facebook_relevant INTEGER)")
            .execute(&pool)
            .await
            .unwrap();

        sync_table::<LabeledHostsTableSchema>(&pool).await.unwrap();
        sync_table::<LabeledHostsTableSchema>(&pool).await.unwrap();

        let columns = introspect_table(&pool, "labeled_hosts").await.unwrap();
        assert_eq!(columns.iter().filter(|c| c.name == "labeled_at").count(), 1);
    }

    #[tokio::test]
    async fn test_sync_skips_missing_table() {
        let pool = setup_test_db().await;
        assert!(sync_table::<HostsTableSchema>(&pool).await.is_ok());
    }
}
