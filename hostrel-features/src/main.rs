//! hostrel-features - batch feature pass
//!
//! Computes per-host, per-platform video statistics from `found_videos`
//! and stores them in `host_features`. Safe to interrupt and re-run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hostrel_common::config::{resolve_database_path, TomlConfig};
use hostrel_common::db::init_database;
use hostrel_common::Platform;
use hostrel_features::{load_features, run_feature_pass, FeaturePassOptions, LogProgress};
use tracing::{info, warn};

/// Command-line arguments for hostrel-features
#[derive(Parser, Debug)]
#[command(name = "hostrel-features")]
#[command(about = "Compute per-host video features for the relevance classifier")]
#[command(version)]
struct Args {
    /// SQLite database file
    #[arg(short, long, env = "HOSTREL_DATABASE")]
    database: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = "HOSTREL_CONFIG")]
    config: Option<PathBuf>,

    /// Hosts between progress log lines (overrides config)
    #[arg(long)]
    progress_interval: Option<u64>,

    /// Only recompute these hosts (repeatable)
    #[arg(long = "host")]
    hosts: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = TomlConfig::locate(args.config.as_deref());
    let config = TomlConfig::load_optional(config_path.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        "Starting hostrel-features v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &config_path {
        Some(path) => info!("Loaded config file: {}", path.display()),
        None => info!("No config file found, using built-in defaults"),
    }

    let db_path = resolve_database_path(args.database.as_deref(), &config);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let interval = args.progress_interval.unwrap_or(config.features.progress_interval);
    let mut progress = LogProgress::new(interval);
    let options = FeaturePassOptions { hosts: args.hosts };

    let summary = run_feature_pass(&pool, &mut progress, &options)
        .await
        .context("Feature pass aborted")?;

    // Explicit hosts: show what was stored
    for hostname in &options.hosts {
        match load_features(&pool, hostname).await? {
            Some(record) => {
                info!("{}: {} articles", record.hostname, record.article_count);
                for platform in Platform::ALL {
                    let features = record.platform(platform);
                    info!(
                        "  {:<8} count={} sum={} sum_distinct={} std_dev={:.4}",
                        platform.as_str(),
                        features.count,
                        features.sum,
                        features.sum_distinct,
                        features.std_dev
                    );
                }
            }
            None => warn!("{}: no feature record", hostname),
        }
    }

    pool.close().await;

    if summary.failed > 0 {
        warn!("{} hosts failed; re-run to retry them", summary.failed);
        anyhow::bail!("{} hosts could not be processed", summary.failed);
    }

    Ok(())
}
