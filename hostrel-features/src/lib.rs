//! hostrel-features library - batch feature pass
//!
//! Computes one feature record per host from its video occurrences and
//! stores it in `host_features`. Re-running overwrites every feature column,
//! so an interrupted pass is resumed by running it again.

pub mod pass;
pub mod progress;
pub mod writer;

pub use pass::{compute_host_features, run_feature_pass, FeaturePassOptions, FeaturePassSummary};
pub use progress::{LogProgress, ProgressSink};
pub use writer::{load_features, write_features, FeatureRecord, PlatformFeatures};
