//! Labeling ledger
//!
//! A row in `labeled_hosts` is the only "done" marker for a host. Rows are
//! inserted once and never updated, so a host is labeled at most once; the
//! pending set is recomputed from storage on every run, so a crash before a
//! commit leaves the host pending and a crash after it never shows the host
//! again.

use hostrel_common::db::relevance_column;
use hostrel_common::{Error, LabelCodes, Platform, RelevanceCode, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

/// Host totals shown at session start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerStatus {
    pub total_hosts: u64,
    pub labeled: u64,
    pub pending: u64,
}

/// RNG for one labeling session
///
/// A fixed seed reproduces the host order; without one the order differs
/// on every run.
pub fn session_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Read/insert access to `labeled_hosts`
#[derive(Debug, Clone)]
pub struct LabelLedger {
    pool: SqlitePool,
}

impl LabelLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Hosts without a label record, alphabetically
    async fn unlabeled_hosts(&self) -> Result<Vec<String>> {
        let hosts: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT hosts.hostname
            FROM hosts
            LEFT JOIN labeled_hosts ON labeled_hosts.hostname = hosts.hostname
            WHERE labeled_hosts.hostname IS NULL
            ORDER BY hosts.hostname
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(hosts)
    }

    /// Hosts without a label record, shuffled with `rng`
    ///
    /// The shuffle starts from a sorted list, so the same seed yields the
    /// same order whatever the storage order is.
    pub async fn pending_hosts<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<String>> {
        let mut hosts = self.unlabeled_hosts().await?;
        hosts.shuffle(rng);
        Ok(hosts)
    }

    pub async fn is_labeled(&self, hostname: &str) -> Result<bool> {
        let labeled: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM labeled_hosts WHERE hostname = ?)")
            .bind(hostname)
            .fetch_one(&self.pool)
            .await?;

        Ok(labeled)
    }

    /// Insert the label record for a host
    ///
    /// Committed before returning. Fails with [`Error::DuplicateLabel`] if the
    /// host already has a record; the existing record is left untouched.
    pub async fn commit_label(&self, hostname: &str, codes: &LabelCodes) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM labeled_hosts WHERE hostname = ?)")
            .bind(hostname)
            .fetch_one(&mut *tx)
            .await?;
        if exists {
            return Err(Error::DuplicateLabel(hostname.to_string()));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO labeled_hosts (hostname, twitter_relevant, facebook_relevant, youtube_relevant, labeled_at)
            VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(hostname)
        .bind(codes.get(Platform::Twitter).as_i64())
        .bind(codes.get(Platform::Facebook).as_i64())
        .bind(codes.get(Platform::Youtube).as_i64())
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(Error::DuplicateLabel(hostname.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        debug!("Committed label for {}", hostname);
        Ok(())
    }

    /// Stored codes for a host, if labeled
    pub async fn load_label(&self, hostname: &str) -> Result<Option<LabelCodes>> {
        let row = sqlx::query(
            "SELECT twitter_relevant, facebook_relevant, youtube_relevant FROM labeled_hosts WHERE hostname = ?",
        )
        .bind(hostname)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut codes = LabelCodes::all_absent();
        for platform in Platform::ALL {
            let value: i64 = row.try_get(relevance_column(platform))?;
            codes.set(platform, RelevanceCode::from_i64(value)?);
        }
        Ok(Some(codes))
    }

    pub async fn status(&self) -> Result<LedgerStatus> {
        let total_hosts: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT hostname) FROM hosts")
            .fetch_one(&self.pool)
            .await?;
        let labeled: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT hosts.hostname) FROM hosts JOIN labeled_hosts ON labeled_hosts.hostname = hosts.hostname",
        )
        .fetch_one(&self.pool)
        .await?;

        let status = LedgerStatus {
            total_hosts: total_hosts as u64,
            labeled: labeled as u64,
            pending: (total_hosts - labeled).max(0) as u64,
        };
        info!(
            "Ledger: {} of {} hosts labeled, {} pending",
            status.labeled, status.total_hosts, status.pending
        );
        Ok(status)
    }
}
