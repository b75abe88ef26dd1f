//! hostrel-label - interactive labeling of host video relevance
//!
//! Presents every unlabeled host once, in random order, and stores the
//! annotator's judgment per platform. Answer `q` to stop; unfinished hosts
//! are offered again next time.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hostrel_common::config::{resolve_database_path, TomlConfig};
use hostrel_common::db::init_database;
use hostrel_label::{session_rng, ConsoleSink, LabelSession};
use tracing::info;

/// Command-line arguments for hostrel-label
#[derive(Parser, Debug)]
#[command(name = "hostrel-label")]
#[command(about = "Label whether a host's embedded videos are relevant to its content")]
#[command(version)]
struct Args {
    /// SQLite database file
    #[arg(short, long, env = "HOSTREL_DATABASE")]
    database: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = "HOSTREL_CONFIG")]
    config: Option<PathBuf>,

    /// Shuffle seed for a reproducible host order (overrides config)
    #[arg(long, env = "HOSTREL_SEED")]
    seed: Option<u64>,

    /// Stop after labeling this many hosts
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = TomlConfig::locate(args.config.as_deref());
    let config = TomlConfig::load_optional(config_path.as_deref()).context("Failed to load configuration")?;

    // Logs go to stderr so they do not interleave with the review table
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        "Starting hostrel-label v{} [{}] built {} ({})",
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

    let seed = args.seed.or(config.labeling.seed);
    if let Some(seed) = seed {
        info!("Using shuffle seed {}", seed);
    }
    let mut rng = session_rng(seed);

    let session = LabelSession::new(pool.clone()).with_limit(args.limit);
    let mut sink = ConsoleSink::stdio();

    let summary = session
        .run(&mut sink, &mut rng)
        .await
        .context("Labeling session aborted")?;

    let status = session.ledger().status().await?;
    println!();
    println!(
        "Labeled {} hosts this session; {} of {} hosts labeled, {} pending",
        summary.labeled, status.labeled, status.total_hosts, status.pending
    );

    pool.close().await;
    Ok(())
}
