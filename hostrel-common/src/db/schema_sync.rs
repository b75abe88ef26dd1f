//! Declarative column synchronization
//!
//! Tables created by older tooling may lack columns this workspace relies
//! on (for example a `host_features` table created before the
//! `*_sum_distinct` columns existed). Each table declares the columns it
//! needs through [`TableSchema`]; on startup missing columns are added with
//! `ALTER TABLE ADD COLUMN`. Type or constraint drift is reported, never
//! rewritten.
//!
//! Initialization order:
//! 1. `CREATE TABLE IF NOT EXISTS`
//! 2. column sync (this module)
//! 3. versioned migrations (`migrations.rs`)

use crate::Result;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

/// Expected column with the constraints ALTER TABLE can honour
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    /// SQL type (TEXT, INTEGER, REAL, TIMESTAMP)
    pub sql_type: String,
    pub not_null: bool,
    pub primary_key: bool,
    /// Literal SQL default, e.g. `"0"` or `"-1.0"`
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            default_value: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Column as reported by `pragma_table_info`
#[derive(Debug, Clone)]
pub struct ActualColumn {
    pub cid: i64,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub pk: bool,
}

/// Difference between a declared and an actual table
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaDrift {
    /// Column absent from the database; fixable
    MissingColumn { table: String, column: ColumnDefinition },
    /// Declared and actual type affinities differ; reported only
    TypeMismatch {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },
}

/// Declared shape of one table
pub trait TableSchema {
    fn table_name() -> &'static str;

    fn expected_columns() -> Vec<ColumnDefinition>;
}

/// Check whether a table exists
pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
    )
    .bind(table_name)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Read the actual columns of a table, ordered by position
pub async fn introspect_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ActualColumn>> {
    let rows = sqlx::query(
        r#"SELECT cid, name, type, "notnull", pk FROM pragma_table_info(?) ORDER BY cid"#,
    )
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| ActualColumn {
            cid: row.get("cid"),
            name: row.get("name"),
            type_name: row.get("type"),
            not_null: row.get::<i64, _>("notnull") != 0,
            pk: row.get::<i64, _>("pk") != 0,
        })
        .collect())
}

/// Compare declared columns against the database
pub fn compare(table: &str, expected: &[ColumnDefinition], actual: &[ActualColumn]) -> Vec<SchemaDrift> {
    let mut drift = Vec::new();

    for column in expected {
        match actual.iter().find(|c| c.name.eq_ignore_ascii_case(&column.name)) {
            Some(found) => {
                if !types_compatible(&column.sql_type, &found.type_name) {
                    drift.push(SchemaDrift::TypeMismatch {
                        table: table.to_string(),
                        column: column.name.clone(),
                        expected: column.sql_type.clone(),
                        actual: found.type_name.clone(),
                    });
                }
            }
            None => drift.push(SchemaDrift::MissingColumn {
                table: table.to_string(),
                column: column.clone(),
            }),
        }
    }

    drift
}

/// SQLite type affinity comparison
fn types_compatible(expected: &str, actual: &str) -> bool {
    fn affinity(sql_type: &str) -> &'static str {
        let t = sql_type.to_uppercase();
        if t.contains("INT") {
            "INTEGER"
        } else if t.contains("CHAR") || t.contains("CLOB") || t.contains("TEXT") {
            "TEXT"
        } else if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") {
            "REAL"
        } else if t.is_empty() || t.contains("BLOB") {
            "BLOB"
        } else {
            "NUMERIC"
        }
    }

    affinity(expected) == affinity(actual)
}

/// Add missing columns to one table
pub async fn sync_table<T: TableSchema>(pool: &SqlitePool) -> Result<()> {
    let table = T::table_name();

    if !table_exists(pool, table).await? {
        warn!("Schema sync: table '{}' does not exist, skipping", table);
        return Ok(());
    }

    let actual = introspect_table(pool, table).await?;
    let drift = compare(table, &T::expected_columns(), &actual);

    if drift.is_empty() {
        debug!("Schema sync: '{}' up to date", table);
        return Ok(());
    }

    for change in drift {
        match change {
            SchemaDrift::MissingColumn { table, column } => add_column(pool, &table, &column).await?,
            SchemaDrift::TypeMismatch {
                table,
                column,
                expected,
                actual,
            } => {
                warn!(
                    "Schema sync: {}.{} expected type '{}', found '{}'; manual migration required",
                    table, column, expected, actual
                );
            }
        }
    }

    Ok(())
}

/// `ALTER TABLE ADD COLUMN` for a declared column
///
/// Table and column names come from [`TableSchema`] implementations, never
/// from data.
async fn add_column(pool: &SqlitePool, table: &str, column: &ColumnDefinition) -> Result<()> {
    let mut sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column.name, column.sql_type);

    if column.primary_key {
        warn!(
            "Schema sync: cannot add PRIMARY KEY column {}.{}; adding it without the constraint",
            table, column.name
        );
    }

    match (&column.default_value, column.not_null) {
        (Some(default), true) => sql.push_str(&format!(" NOT NULL DEFAULT {}", default)),
        (Some(default), false) => sql.push_str(&format!(" DEFAULT {}", default)),
        (None, true) => warn!(
            "Schema sync: NOT NULL column {}.{} has no default; adding it as nullable",
            table, column.name
        ),
        (None, false) => {}
    }

    match sqlx::query(&sql).execute(pool).await {
        Ok(_) => {
            info!("Schema sync: added column {}.{} ({})", table, column.name, column.sql_type);
            Ok(())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => Ok(()),
        Err(e) => Err(e.into()),
    }
}
