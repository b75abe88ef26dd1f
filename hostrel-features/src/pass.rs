//! The feature pass: aggregate and store every host, one at a time
//!
//! Each host is an independent unit of work with its own transaction. A
//! host-level failure is logged and counted and the pass moves on; a fatal
//! error (store unavailable) stops the pass.

use hostrel_common::db::{host_exists, list_hostnames};
use hostrel_common::{load_host_aggregate, Error, Platform, Result};
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use crate::progress::ProgressSink;
use crate::writer::{write_features, FeatureRecord};

/// Which hosts to process
#[derive(Debug, Clone, Default)]
pub struct FeaturePassOptions {
    /// Explicit hosts; every host in `hosts` when empty
    pub hosts: Vec<String>,
}

/// Outcome counters of one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeaturePassSummary {
    /// Hosts whose feature record was written
    pub processed: u64,
    /// Written hosts without a single occurrence
    pub empty_hosts: u64,
    /// Hosts skipped after a non-fatal error
    pub failed: u64,
}

/// Compute and store the feature record of one host
///
/// Hosts missing from `hosts` get no record.
pub async fn compute_host_features(pool: &SqlitePool, hostname: &str) -> Result<FeatureRecord> {
    if !host_exists(pool, hostname).await? {
        return Err(Error::NotFound(format!("host {}", hostname)));
    }

    let aggregate = load_host_aggregate(pool, hostname).await?;
    if aggregate.is_empty() {
        warn!("{} has no video occurrences; storing sentinel features", hostname);
    }

    let record = FeatureRecord::from_aggregate(&aggregate);
    write_features(pool, &record).await?;
    Ok(record)
}

/// Run the pass over all (or the selected) hosts
pub async fn run_feature_pass(
    pool: &SqlitePool,
    progress: &mut dyn ProgressSink,
    options: &FeaturePassOptions,
) -> Result<FeaturePassSummary> {
    let hosts = if options.hosts.is_empty() {
        list_hostnames(pool).await?
    } else {
        options.hosts.clone()
    };

    let mut summary = FeaturePassSummary::default();
    progress.start(hosts.len() as u64);

    for hostname in &hosts {
        match compute_host_features(pool, hostname).await {
            Ok(record) => {
                summary.processed += 1;
                if record_is_empty(&record) {
                    summary.empty_hosts += 1;
                }
                debug!("{}: article_count={}", hostname, record.article_count);
            }
            Err(e) if e.is_fatal() => {
                error!("Aborting feature pass at {}: {}", hostname, e);
                return Err(e);
            }
            Err(e) => {
                error!("Skipping {}: {}", hostname, e);
                summary.failed += 1;
            }
        }
        progress.inc();
    }

    info!(
        "Feature pass finished: {} written ({} without videos), {} failed",
        summary.processed, summary.empty_hosts, summary.failed
    );
    Ok(summary)
}

fn record_is_empty(record: &FeatureRecord) -> bool {
    Platform::ALL.iter().all(|&p| record.platform(p).count == 0)
}
