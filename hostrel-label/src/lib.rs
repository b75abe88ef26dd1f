//! hostrel-label library - interactive relevance labeling
//!
//! An annotator reviews each unlabeled host's per-article video counts and
//! records one relevance code per platform. Labels are written once and
//! never revised.

pub mod ledger;
pub mod session;
pub mod sink;

pub use ledger::{session_rng, LabelLedger, LedgerStatus};
pub use session::{article_table, collect_codes, HostOutcome, LabelSession, SessionState, SessionSummary};
pub use sink::{ConsoleSink, ReviewSink, TableSpec};
