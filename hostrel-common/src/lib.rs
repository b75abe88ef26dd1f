//! # hostrel common library
//!
//! Shared code for the hostrel tools:
//! - Error taxonomy and configuration loading
//! - Platform and relevance code definitions
//! - Database initialization, schema sync, migrations
//! - Occurrence reads and per-host aggregation

pub mod aggregate;
pub mod config;
pub mod db;
pub mod error;
pub mod platform;
pub mod relevance;

pub use aggregate::{aggregate, load_host_aggregate, HostAggregate, PlatformStats, STD_DEV_ABSENT};
pub use error::{Error, Result};
pub use platform::Platform;
pub use relevance::{LabelCodes, RelevanceCode};
